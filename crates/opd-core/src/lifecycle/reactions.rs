//! Standard reactions: registration cascade, deletion cascade and the OPD
//! counter maintenance.

use super::{EntityKind, Event, Phase, Reaction, ReactionError, ReactionResult};
use crate::auth;
use crate::db::{Store, DOCTOR_GROUP};
use crate::models::{Address, AuthToken, Doctor, Inventory, Opd, OpdCounter};

/// Standard reactions in dispatch order.
pub fn default_reactions() -> Vec<Reaction> {
    vec![
        Reaction::new(
            "issue_credentials",
            EntityKind::Principal,
            Phase::Created,
            issue_credentials,
        ),
        Reaction::new(
            "create_placeholder_doctor",
            EntityKind::Principal,
            Phase::Created,
            create_placeholder_doctor,
        ),
        Reaction::new(
            "create_placeholder_opd",
            EntityKind::Doctor,
            Phase::Created,
            create_placeholder_opd,
        ),
        Reaction::new(
            "create_inventory",
            EntityKind::Opd,
            Phase::Created,
            create_inventory,
        ),
        Reaction::new(
            "cascade_principal_delete",
            EntityKind::Principal,
            Phase::PreDelete,
            cascade_principal_delete,
        ),
        Reaction::new(
            "count_appointment_created",
            EntityKind::Appointment,
            Phase::Created,
            count_appointment_created,
        ),
        Reaction::new(
            "count_appointment_deleted",
            EntityKind::Appointment,
            Phase::Deleted,
            count_appointment_deleted,
        ),
        Reaction::new(
            "count_patient_created",
            EntityKind::Patient,
            Phase::Created,
            count_patient_created,
        ),
        Reaction::new(
            "count_patient_deleted",
            EntityKind::Patient,
            Phase::Deleted,
            count_patient_deleted,
        ),
    ]
}

/// Issue the principal's token and add it to the Doctor group.
fn issue_credentials(store: &Store<'_>, event: &Event) -> ReactionResult<Vec<Event>> {
    let token = AuthToken::new(auth::generate_token_key(), event.id.clone());
    store.insert_token(&token)?;
    store.add_principal_to_group(&event.id, DOCTOR_GROUP)?;
    Ok(Vec::new())
}

/// Create the placeholder address and doctor for a new principal.
fn create_placeholder_doctor(store: &Store<'_>, event: &Event) -> ReactionResult<Vec<Event>> {
    let address = Address::placeholder();
    store.insert_address(&address)?;

    let doctor = Doctor::placeholder(event.id.clone(), Some(address.id.clone()));
    store.insert_doctor(&doctor)?;

    tracing::debug!(principal = %event.id, doctor = %doctor.id, "placeholder doctor created");
    Ok(vec![
        Event::created(EntityKind::Address, address.id),
        Event::created(EntityKind::Doctor, doctor.id),
    ])
}

fn create_placeholder_opd(store: &Store<'_>, event: &Event) -> ReactionResult<Vec<Event>> {
    let opd = Opd::placeholder(event.id.clone());
    store.insert_opd(&opd)?;
    Ok(vec![Event::created(EntityKind::Opd, opd.id).owned_by(event.id.clone())])
}

/// Create the inventory of the OPD's doctor.
fn create_inventory(store: &Store<'_>, event: &Event) -> ReactionResult<Vec<Event>> {
    let doctor_id = match &event.owner {
        Some(doctor_id) => doctor_id.clone(),
        None => store
            .get_opd(&event.id)?
            .map(|opd| opd.doctor_id)
            .ok_or_else(|| ReactionError::OrphanReference {
                kind: EntityKind::Opd,
                id: event.id.clone(),
                missing: "opd row",
            })?,
    };

    let inventory = Inventory::new(doctor_id.clone());
    store.insert_inventory(&inventory)?;
    Ok(vec![Event::created(EntityKind::Inventory, inventory.id).owned_by(doctor_id)])
}

/// Remove the principal's doctor and that doctor's address.
///
/// A principal without a doctor is not an error. The doctor's OPD,
/// inventory, appointments and patients go with it through store cascades.
fn cascade_principal_delete(store: &Store<'_>, event: &Event) -> ReactionResult<Vec<Event>> {
    let Some(doctor) = store.get_doctor_by_principal(&event.id)? else {
        tracing::info!(principal = %event.id, "principal has no doctor, nothing to cascade");
        return Ok(Vec::new());
    };

    let mut follow_ups = Vec::new();
    if let Some(address_id) = &doctor.address_id {
        store.delete_address(address_id)?;
        follow_ups.push(Event::deleted(EntityKind::Address, address_id.clone()));
    }
    store.delete_doctor(&doctor.id)?;
    follow_ups.push(Event::deleted(EntityKind::Doctor, doctor.id.clone()));

    tracing::info!(principal = %event.id, doctor = %doctor.id, "doctor cascade deleted");
    Ok(follow_ups)
}

fn count_appointment_created(store: &Store<'_>, event: &Event) -> ReactionResult<Vec<Event>> {
    adjust_counter(store, event, OpdCounter::Appointments, 1)
}

fn count_appointment_deleted(store: &Store<'_>, event: &Event) -> ReactionResult<Vec<Event>> {
    adjust_counter(store, event, OpdCounter::Appointments, -1)
}

fn count_patient_created(store: &Store<'_>, event: &Event) -> ReactionResult<Vec<Event>> {
    adjust_counter(store, event, OpdCounter::ActivePatient, 1)
}

fn count_patient_deleted(store: &Store<'_>, event: &Event) -> ReactionResult<Vec<Event>> {
    adjust_counter(store, event, OpdCounter::ActivePatient, -1)
}

/// Apply `delta` to the owning doctor's OPD counter with one atomic statement.
///
/// Capacity is not enforced here: the counter has to match the live row
/// count, so crossing capacity is only logged.
fn adjust_counter(
    store: &Store<'_>,
    event: &Event,
    counter: OpdCounter,
    delta: i64,
) -> ReactionResult<Vec<Event>> {
    let orphan = |missing: &'static str| ReactionError::OrphanReference {
        kind: event.kind,
        id: event.id.clone(),
        missing,
    };

    let doctor_id = event.owner.as_deref().ok_or_else(|| orphan("doctor"))?;
    let opd = store.get_opd_for_doctor(doctor_id)?.ok_or_else(|| orphan("opd"))?;
    let state = store
        .increment_opd_counter(&opd.id, counter, delta)?
        .ok_or_else(|| orphan("opd"))?;

    if counter == OpdCounter::ActivePatient && state.value > state.max_patient_capacity {
        tracing::warn!(
            opd = %opd.id,
            active_patient = state.value,
            max_patient_capacity = state.max_patient_capacity,
            "active patients exceed OPD capacity"
        );
    }
    Ok(Vec::new())
}
