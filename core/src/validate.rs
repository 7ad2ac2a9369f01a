//! Static precondition checks for actions.
//!
//! Everything here is evaluated against the host state without waiting for
//! resolution. The same checks run again at execution time, against the state
//! left behind by earlier actions in the tick.
//!
//! Check order, per action: arguments, capability, target, resources, range.

use crate::{
    action::{Action, MoveTarget},
    body::{self, BodyPart},
    capability::Capability,
    entity::{Entity, EntityKind, Ownership, SIGN_MAX_LENGTH},
    host::Host,
    position::{PathStep, Position},
    resource::ResourceType,
    result_code::ResultCode,
};

pub const ADJACENT: u32 = 1;
pub const RANGED: u32 = 3;
pub const SAFE_MODE_GHODIUM_COST: u32 = 1000;
pub const RENEW_TICKS_BASE: u32 = 500;

type Check = Result<(), ResultCode>;

/// Actor-level checks: existence, ownership, still-spawning.
pub fn validate_actor<'h>(host: &'h dyn Host, actor_id: &str) -> Result<&'h Entity, ResultCode> {
    let actor = host.object(actor_id).ok_or(ResultCode::NotFound)?;
    if !actor.is_mine() {
        return Err(ResultCode::NotOwner);
    }
    if actor.as_creep().is_some_and(|c| c.spawning) {
        return Err(ResultCode::Busy);
    }
    Ok(actor)
}

/// Action-level checks for an actor that already passed `validate_actor`.
pub fn validate_action(host: &dyn Host, actor: &Entity, action: &Action) -> ResultCode {
    match check(host, actor, action) {
        Ok(()) => ResultCode::Ok,
        Err(code) => code,
    }
}

fn check(host: &dyn Host, actor: &Entity, action: &Action) -> Check {
    match action {
        Action::Move { .. } => {
            creep_with(actor, &[Capability::Move])?;
            not_tired(actor)
        }
        Action::MoveTo { target, opts } => {
            args(opts.is_valid() && target.is_valid())?;
            creep_with(actor, &[Capability::Move])?;
            move_goal(host, actor, target)?;
            not_tired(actor)
        }
        Action::MoveByPath { path } => {
            args(!path.is_empty() && path.iter().all(PathStep::is_consistent))?;
            creep_with(actor, &[Capability::Move])?;
            not_tired(actor)?;
            next_path_step(actor, path).map(|_| ()).ok_or(ResultCode::NotFound)
        }
        Action::Attack { target } => {
            creep_with(actor, &[Capability::Attack])?;
            let target = attackable(host, actor, target)?;
            in_range(actor, target, ADJACENT)
        }
        Action::RangedAttack { target } => {
            creep_with(actor, &[Capability::RangedAttack])?;
            let target = attackable(host, actor, target)?;
            in_range(actor, target, RANGED)
        }
        Action::RangedMassAttack => {
            creep_with(actor, &[Capability::RangedAttack]).map(|_| ())
        }
        Action::Heal { target } => {
            creep_with(actor, &[Capability::Heal])?;
            let target = healable(host, target)?;
            in_range(actor, target, ADJACENT)
        }
        Action::RangedHeal { target } => {
            creep_with(actor, &[Capability::Heal])?;
            let target = healable(host, target)?;
            in_range(actor, target, RANGED)
        }
        Action::Harvest { target } => {
            creep_with(actor, &[Capability::Work])?;
            let target = target_of(host, target)?;
            let source = target.as_source().ok_or(ResultCode::InvalidTarget)?;
            if source.energy == 0 {
                return Err(ResultCode::NotEnoughResources);
            }
            in_range(actor, target, ADJACENT)
        }
        Action::Build { target } => {
            let creep = creep_with(actor, &[Capability::Work, Capability::Carry])?;
            let target = target_of(host, target)?;
            if target.as_site().is_none() || !target.is_mine() {
                return Err(ResultCode::InvalidTarget);
            }
            has_energy(creep.carry.get(ResourceType::Energy))?;
            in_range(actor, target, RANGED)
        }
        Action::Repair { target } => {
            let creep = creep_with(actor, &[Capability::Work, Capability::Carry])?;
            let target = target_of(host, target)?;
            if target.structure_hits().is_none() {
                return Err(ResultCode::InvalidTarget);
            }
            has_energy(creep.carry.get(ResourceType::Energy))?;
            in_range(actor, target, RANGED)
        }
        Action::Dismantle { target } => {
            creep_with(actor, &[Capability::Work])?;
            let target = target_of(host, target)?;
            if target.structure_hits().is_none() {
                return Err(ResultCode::InvalidTarget);
            }
            in_range(actor, target, ADJACENT)
        }
        Action::Transfer { target, resource, amount } => {
            args(*amount != Some(0))?;
            let creep = creep_with(actor, &[])?;
            let target = target_of(host, target)?;
            if target.id == actor.id {
                return Err(ResultCode::InvalidTarget);
            }
            let free = target.free_capacity(*resource).ok_or(ResultCode::InvalidTarget)?;
            let held = creep.carry.get(*resource);
            let wanted = amount.unwrap_or(held);
            if held == 0 || wanted > held {
                return Err(ResultCode::NotEnoughResources);
            }
            if free == 0 || amount.is_some_and(|a| a > free) {
                return Err(ResultCode::Full);
            }
            in_range(actor, target, ADJACENT)
        }
        Action::Withdraw { target, resource, amount } => {
            args(*amount != Some(0))?;
            let creep = creep_with(actor, &[])?;
            let target = target_of(host, target)?;
            if target.as_spawn().is_none() {
                return Err(ResultCode::InvalidTarget);
            }
            let held = target.stored(*resource).unwrap_or(0);
            let wanted = amount.unwrap_or(held);
            if held == 0 || wanted > held {
                return Err(ResultCode::NotEnoughResources);
            }
            let free = creep.carry.free();
            if free == 0 || amount.is_some_and(|a| a > free) {
                return Err(ResultCode::Full);
            }
            in_range(actor, target, ADJACENT)
        }
        Action::Drop { resource, amount } => {
            args(*amount != Some(0))?;
            let creep = creep_with(actor, &[])?;
            let held = creep.carry.get(*resource);
            if held == 0 || amount.is_some_and(|a| a > held) {
                return Err(ResultCode::NotEnoughResources);
            }
            Ok(())
        }
        Action::Pickup { target } => {
            let creep = creep_with(actor, &[])?;
            let target = target_of(host, target)?;
            if target.as_resource().is_none() {
                return Err(ResultCode::InvalidTarget);
            }
            if creep.carry.free() == 0 {
                return Err(ResultCode::Full);
            }
            in_range(actor, target, ADJACENT)
        }
        Action::UpgradeController { target } => {
            let creep = creep_with(actor, &[Capability::Work, Capability::Carry])?;
            let target = target_of(host, target)?;
            let controller = target.as_controller().ok_or(ResultCode::InvalidTarget)?;
            if !target.is_mine() || controller.level == 0 {
                return Err(ResultCode::InvalidTarget);
            }
            has_energy(creep.carry.get(ResourceType::Energy))?;
            in_range(actor, target, RANGED)
        }
        Action::ClaimController { target } => {
            creep_with(actor, &[Capability::Claim])?;
            let target = target_of(host, target)?;
            let controller = target.as_controller().ok_or(ResultCode::InvalidTarget)?;
            if target.owner != Ownership::Neutral {
                return Err(ResultCode::InvalidTarget);
            }
            if controller.reservation.as_ref().is_some_and(|r| r.username != host.username()) {
                return Err(ResultCode::InvalidTarget);
            }
            if host.owned_controller_count() >= host.gcl().level {
                return Err(ResultCode::GclNotEnough);
            }
            in_range(actor, target, ADJACENT)
        }
        Action::ReserveController { target } => {
            creep_with(actor, &[Capability::Claim])?;
            let target = target_of(host, target)?;
            let controller = target.as_controller().ok_or(ResultCode::InvalidTarget)?;
            if target.owner != Ownership::Neutral
                || controller.reservation.as_ref().is_some_and(|r| r.username != host.username())
            {
                return Err(ResultCode::InvalidTarget);
            }
            in_range(actor, target, ADJACENT)
        }
        Action::AttackController { target } => {
            creep_with(actor, &[Capability::Claim])?;
            let target = target_of(host, target)?;
            let controller = target.as_controller().ok_or(ResultCode::InvalidTarget)?;
            let reserved_by_other = controller
                .reservation
                .as_ref()
                .is_some_and(|r| r.username != host.username());
            if !target.owner.is_hostile() && !reserved_by_other {
                return Err(ResultCode::InvalidTarget);
            }
            in_range(actor, target, ADJACENT)
        }
        Action::GenerateSafeMode { target } => {
            let creep = creep_with(actor, &[])?;
            let target = target_of(host, target)?;
            if target.as_controller().is_none() || !target.is_mine() {
                return Err(ResultCode::InvalidTarget);
            }
            if creep.carry.get(ResourceType::Ghodium) < SAFE_MODE_GHODIUM_COST {
                return Err(ResultCode::NotEnoughResources);
            }
            in_range(actor, target, ADJACENT)
        }
        Action::SignController { target, text } => {
            args(text.chars().count() <= SIGN_MAX_LENGTH)?;
            creep_with(actor, &[])?;
            let target = target_of(host, target)?;
            if target.as_controller().is_none() {
                return Err(ResultCode::InvalidTarget);
            }
            in_range(actor, target, ADJACENT)
        }
        Action::Suicide | Action::Say { .. } | Action::NotifyWhenAttacked { .. } => {
            creep_with(actor, &[]).map(|_| ())
        }
        Action::SpawnCreep { body, name, memory } => {
            args(body::is_valid_spawn_body(body))?;
            args(name.as_deref().map_or(true, |n| !n.is_empty()))?;
            args(memory.as_ref().map_or(true, |m| m.is_object()))?;
            let spawn = spawn_of(actor)?;
            if spawn.spawning.is_some() {
                return Err(ResultCode::Busy);
            }
            if name.as_deref().is_some_and(|n| host.creep_by_name(n).is_some()) {
                return Err(ResultCode::NameExists);
            }
            if spawn.energy < body::body_cost(body.iter().copied()) {
                return Err(ResultCode::NotEnoughEnergy);
            }
            room_level_at_least(host, actor, 1)
        }
        Action::RecycleCreep { target } => {
            spawn_of(actor)?;
            let target = my_creep(host, target)?;
            in_range(actor, target, ADJACENT)
        }
        Action::RenewCreep { target } => {
            let spawn = spawn_of(actor)?;
            if spawn.spawning.is_some() {
                return Err(ResultCode::Busy);
            }
            let target = my_creep(host, target)?;
            let creep = target.as_creep().ok_or(ResultCode::InvalidTarget)?;
            if creep.spawning || creep.body.parts().any(|p| p == BodyPart::Claim) {
                return Err(ResultCode::InvalidTarget);
            }
            let (gain, cost) = renew_terms(&creep.body);
            if creep.ticks_to_live.saturating_add(gain) > creep.body.life_time() {
                return Err(ResultCode::Full);
            }
            if spawn.energy < cost {
                return Err(ResultCode::NotEnoughEnergy);
            }
            in_range(actor, target, ADJACENT)
        }
    }
}

/// Ticks gained and energy spent by one renewal.
pub fn renew_terms(body: &body::Body) -> (u32, u32) {
    let size = body.len().max(1) as u32;
    let gain = RENEW_TICKS_BASE / size;
    let cost = body.cost().div_ceil(3 * size);
    (gain, cost)
}

/// The tile a `move_to` heads for. An object target must exist and must not
/// be the actor itself.
pub fn move_goal(host: &dyn Host, actor: &Entity, target: &MoveTarget) -> Result<Position, ResultCode> {
    match target {
        MoveTarget::Object(id) => {
            let target = target_of(host, id)?;
            if target.id == actor.id {
                return Err(ResultCode::InvalidTarget);
            }
            Ok(target.pos.clone())
        }
        MoveTarget::Pos(pos) => Ok(pos.clone()),
        MoveTarget::Xy { x, y } => Ok(Position::new(actor.pos.room.clone(), *x, *y)),
    }
}

/// Index of the step that starts at the actor's tile.
pub fn next_path_step(actor: &Entity, path: &[PathStep]) -> Option<usize> {
    let here = (actor.pos.x as i32, actor.pos.y as i32);
    path.iter().position(|step| step.origin() == here)
}

fn args(ok: bool) -> Check {
    if ok { Ok(()) } else { Err(ResultCode::InvalidArgs) }
}

fn creep_with<'a>(actor: &'a Entity, caps: &[Capability]) -> Result<&'a crate::entity::CreepState, ResultCode> {
    let creep = actor.as_creep().ok_or(ResultCode::InvalidArgs)?;
    if !actor.capabilities().contains_all(caps) {
        return Err(ResultCode::NoBodypart);
    }
    Ok(creep)
}

fn spawn_of(actor: &Entity) -> Result<&crate::entity::SpawnState, ResultCode> {
    if !actor.capabilities().contains(Capability::Spawn) {
        return Err(ResultCode::NoBodypart);
    }
    actor.as_spawn().ok_or(ResultCode::InvalidArgs)
}

fn not_tired(actor: &Entity) -> Check {
    match actor.as_creep() {
        Some(c) if c.fatigue > 0 => Err(ResultCode::Tired),
        _ => Ok(()),
    }
}

fn has_energy(amount: u32) -> Check {
    if amount == 0 { Err(ResultCode::NotEnoughResources) } else { Ok(()) }
}

fn target_of<'h>(host: &'h dyn Host, id: &str) -> Result<&'h Entity, ResultCode> {
    host.object(id).ok_or(ResultCode::InvalidTarget)
}

fn attackable<'h>(host: &'h dyn Host, actor: &Entity, id: &str) -> Result<&'h Entity, ResultCode> {
    let target = target_of(host, id)?;
    let hittable = matches!(target.kind, EntityKind::Creep(_)) || target.structure_hits().is_some();
    if !hittable || target.id == actor.id {
        return Err(ResultCode::InvalidTarget);
    }
    Ok(target)
}

fn healable<'h>(host: &'h dyn Host, id: &str) -> Result<&'h Entity, ResultCode> {
    let target = target_of(host, id)?;
    if target.as_creep().is_none() {
        return Err(ResultCode::InvalidTarget);
    }
    Ok(target)
}

fn my_creep<'h>(host: &'h dyn Host, id: &str) -> Result<&'h Entity, ResultCode> {
    let target = target_of(host, id)?;
    if target.as_creep().is_none() || !target.is_mine() {
        return Err(ResultCode::InvalidTarget);
    }
    Ok(target)
}

fn in_range(actor: &Entity, target: &Entity, range: u32) -> Check {
    if actor.pos.in_range_to(&target.pos, range) {
        Ok(())
    } else {
        Err(ResultCode::NotInRange)
    }
}

fn room_level_at_least(host: &dyn Host, actor: &Entity, level: u8) -> Check {
    let ok = host
        .objects_in_room(&actor.pos.room)
        .into_iter()
        .any(|e| e.is_mine() && e.as_controller().is_some_and(|c| c.level >= level));
    if ok { Ok(()) } else { Err(ResultCode::RclNotEnough) }
}
