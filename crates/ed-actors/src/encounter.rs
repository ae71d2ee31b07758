//! Conversations between nearby actors.
//!
//! An encounter only starts between two actors that are both free and
//! within `chat_radius` tiles of each other, and only when one side wants
//! it.  Both sides then react; staff react before the patient so a nurse
//! or doctor sees the patient's state as it was when they met.

use ed_core::{Role, minutes};
use tracing::debug;

use crate::actor::Actor;
use crate::context::TickContext;
use crate::patient;
use crate::plan::{Plan, places};
use crate::scratch::ChatLine;
use crate::state::{Occupied, PatientState};
use crate::text::TextGenerator;

/// Whether `actor` wants to talk to `target`.  A doctor walking to `target`
/// drops its approach plan when it says yes.
pub fn wants_to_chat(actor: &mut Actor, target: &Actor) -> bool {
    match actor.role() {
        Role::Patient     => false,
        Role::TriageNurse => target.patient().is_some_and(|p| p.state == PatientState::Triage),
        Role::BedsideNurse => actor
            .bedside_nurse()
            .is_some_and(|n| n.occupied == Occupied::Attending(target.name.clone())),
        Role::Doctor => {
            let common = &mut actor.scratch.common;
            if common.next_step.as_ref().and_then(Plan::approach_target) == Some(target.name.as_str()) {
                common.clear_plan();
                true
            } else {
                false
            }
        }
    }
}

/// Chebyshev distance within `radius`.
fn within(a: &Actor, b: &Actor, radius: u32) -> bool {
    match (a.tile(), b.tile()) {
        (Some(x), Some(y)) => x.x.abs_diff(y.x) <= radius && x.y.abs_diff(y.y) <= radius,
        _ => false,
    }
}

/// Try to start a conversation between `a` and `b`.  Returns `true` when
/// one started.
pub fn start_encounter(a: &str, b: &str, ctx: &mut TickContext<'_>, text: &dyn TextGenerator) -> bool {
    if a == b {
        return false;
    }
    let Some(mut first) = ctx.roster.take(a) else { return false };
    let Some(mut second) = ctx.roster.take(b) else {
        ctx.roster.insert(first);
        return false;
    };

    let started = !first.scratch.common.is_chatting()
        && !second.scratch.common.is_chatting()
        && within(&first, &second, ctx.config.chat_radius)
        && (wants_to_chat(&mut first, &second) || wants_to_chat(&mut second, &first));

    if started {
        let end = ctx.now + minutes(ctx.config.conversation_minutes);
        let prompt = format!("{} ({}) talks with {} ({}).", first.name, first.role(), second.name, second.role());
        let chat: Vec<ChatLine> = [&first.name, &second.name]
            .into_iter()
            .map(|speaker| (speaker.clone(), text.generate(&format!("{prompt} {speaker} says:"))))
            .filter(|(_, line)| !line.is_empty())
            .collect();
        debug!(a, b, score = text.score(&prompt), "encounter");

        let (a_name, b_name) = (first.name.clone(), second.name.clone());
        for (me, other) in [(&mut first, b_name), (&mut second, a_name)] {
            let common = &mut me.scratch.common;
            common.chatting_with = Some(other);
            common.chatting_end_time = Some(end);
            common.chat = Some(chat.clone());
            common.act_path_set = false;
        }

        if first.role() == Role::Patient {
            react_to_chat(&mut second, &mut first, ctx);
            react_to_chat(&mut first, &mut second, ctx);
        } else {
            react_to_chat(&mut first, &mut second, ctx);
            react_to_chat(&mut second, &mut first, ctx);
        }
    }

    ctx.roster.insert(first);
    ctx.roster.insert(second);
    started
}

/// One pass over the roster: every free actor gets at most one new
/// conversation with the first free partner (by name) that qualifies.
pub fn run_encounters(ctx: &mut TickContext<'_>, text: &dyn TextGenerator) -> usize {
    let names = ctx.roster.names();
    let mut started = 0;
    for a in &names {
        if ctx.roster.get(a).is_none_or(|x| x.scratch.common.is_chatting()) {
            continue;
        }
        for b in &names {
            if a != b && start_encounter(a, b, ctx, text) {
                started += 1;
                break;
            }
        }
    }
    started
}

/// Reaction of `me` to a conversation with `other` that just started.
/// Every branch checks state first, so reacting twice changes nothing.
pub fn react_to_chat(me: &mut Actor, other: &mut Actor, ctx: &mut TickContext<'_>) {
    match me.role() {
        Role::Patient => {
            me.scratch.common.act_path_set = false;
            match other.role() {
                Role::TriageNurse => {
                    let Some((_, common, p)) = me.patient_parts() else { return };
                    if p.state == PatientState::Triage {
                        p.next_room = p.injuries_zone.clone();
                        p.state = PatientState::WaitingForNurse;
                        common.set_plan(Plan::GoToAddress(ctx.ledger.maze.address(places::WAITING_ROOM_CHAIR)));
                    }
                }
                Role::BedsideNurse => {
                    patient::escort_to_bed(me, ctx.ledger, ctx.now);
                }
                Role::Doctor => {
                    patient::do_initial_assessment(me, ctx);
                    let doctor = other.doctor_parts().map(|(name, _, d)| (name, d));
                    patient::do_disposition(me, doctor, ctx);
                }
                Role::Patient => {}
            }
        }
        Role::TriageNurse => {
            let in_triage = other.patient().is_some_and(|p| p.state == PatientState::Triage);
            if let Some((_, _, t)) = me.triage_nurse_parts() {
                if in_triage {
                    t.chatting_patient = Some(other.name.clone());
                }
            }
        }
        Role::BedsideNurse => {
            let Some((_, common, n)) = me.bedside_nurse_parts() else { return };
            if n.occupied != Occupied::Attending(other.name.clone()) {
                return;
            }
            let Some((pname, _, p)) = other.patient_parts() else { return };
            let plan = if p.state == PatientState::WaitingForNurse {
                p.next_room = p.injuries_zone.clone();
                let zone = p.injuries_zone.clone();
                patient::bed_plan(pname, p, ctx.ledger, zone.as_deref())
            } else {
                let room = p.next_room.clone().unwrap_or_else(|| places::WAITING_ROOM.to_string());
                Plan::GoToAddress(ctx.ledger.maze.address(&format!("{room}:chair")))
            };
            common.set_plan(plan);
            n.set_occupied(Occupied::Transfer(pname.to_string()), ctx.now);
        }
        Role::Doctor => {
            let Some(state) = other.patient().map(|p| p.state) else { return };
            let Some((name, common, d)) = me.doctor_parts() else { return };
            d.chatting_patient = Some(other.name.clone());
            if state == PatientState::WaitingForDoctor {
                crate::doctor::release_patient(name, d, &other.name, ctx.ledger, ctx.config);
            }
            common.clear_plan();
        }
    }
}
