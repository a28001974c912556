//! Cache key builders for portal entities.
//!
//! Keys follow `namespace:id[:suffix]`. List and collection keys share a
//! prefix so a single prefix deletion drops every variant.

pub const USERS_LIST_PREFIX: &str = "users:list:";
pub const GROUPS_LIST_PREFIX: &str = "groups:list:";
pub const DOCTORS_LIST_PREFIX: &str = "doctors:list:";
pub const APPOINTMENTS_LIST_PREFIX: &str = "appointments:list:";
pub const ATTENDANCE_PREFIX: &str = "attendance:";

/// Single user record.
pub fn user(id: &str) -> String {
    format!("user:{id}")
}

/// Expanded user view.
pub fn user_details(id: &str) -> String {
    format!("user:{id}:details")
}

/// One filtered page of the user list.
pub fn users_list(filter: &str) -> String {
    format!("{USERS_LIST_PREFIX}{filter}")
}

/// Single group record.
pub fn group(id: &str) -> String {
    format!("group:{id}")
}

/// Expanded group view.
pub fn group_details(id: &str) -> String {
    format!("group:{id}:details")
}

/// One filtered page of the group list.
pub fn groups_list(filter: &str) -> String {
    format!("{GROUPS_LIST_PREFIX}{filter}")
}

/// Single session record.
pub fn session(id: &str) -> String {
    format!("session:{id}")
}

/// Expanded session view.
pub fn session_details(id: &str) -> String {
    format!("session:{id}:details")
}

/// Prefix covering every cached session collection of a group.
pub fn sessions_prefix(group_id: &str) -> String {
    format!("sessions:{group_id}:")
}

/// One filtered session collection of a group.
pub fn sessions(group_id: &str, filter: &str) -> String {
    format!("{}{filter}", sessions_prefix(group_id))
}

/// Prefix covering every cached attendance view of a session.
pub fn attendance_prefix(session_id: &str) -> String {
    format!("{ATTENDANCE_PREFIX}{session_id}:")
}

/// One filtered attendance view of a session.
pub fn attendance(session_id: &str, filter: &str) -> String {
    format!("{}{filter}", attendance_prefix(session_id))
}

/// Single doctor record.
pub fn doctor(id: &str) -> String {
    format!("doctor:{id}")
}

/// Expanded doctor view.
pub fn doctor_details(id: &str) -> String {
    format!("doctor:{id}:details")
}

/// One filtered page of the doctor list.
pub fn doctors_list(filter: &str) -> String {
    format!("{DOCTORS_LIST_PREFIX}{filter}")
}

/// Prefix covering every computed slot list of a doctor.
pub fn availability_prefix(doctor_id: &str) -> String {
    format!("availability:{doctor_id}:")
}

/// Bookable slots of a doctor for one day (`YYYY-MM-DD`).
pub fn availability(doctor_id: &str, date: &str) -> String {
    format!("{}{date}", availability_prefix(doctor_id))
}

/// Single appointment record.
pub fn appointment(id: &str) -> String {
    format!("appointment:{id}")
}

/// Expanded appointment view.
pub fn appointment_details(id: &str) -> String {
    format!("appointment:{id}:details")
}

/// One filtered page of the appointment list.
pub fn appointments_list(filter: &str) -> String {
    format!("{APPOINTMENTS_LIST_PREFIX}{filter}")
}
