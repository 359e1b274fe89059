use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    #[default]
    Open,
    Assigned,
    OnHold,
    Completed,
    Closed,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Open => "OPEN",
            Status::Assigned => "ASSIGNED",
            Status::OnHold => "ONHOLD",
            Status::Completed => "COMPLETED",
            Status::Closed => "CLOSED",
        }
    }
}

impl FromStr for Status {
    type Err = TicketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(Status::Open),
            "ASSIGNED" => Ok(Status::Assigned),
            "ONHOLD" => Ok(Status::OnHold),
            "COMPLETED" => Ok(Status::Completed),
            "CLOSED" => Ok(Status::Closed),
            other => Err(TicketError::InvalidValue {
                field: TicketField::Status,
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        }
    }
}

impl FromStr for Priority {
    type Err = TicketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(Priority::Low),
            "MEDIUM" => Ok(Priority::Medium),
            "HIGH" => Ok(Priority::High),
            other => Err(TicketError::InvalidValue {
                field: TicketField::Priority,
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two ticket fields a supervisor may set directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketField {
    Status,
    Priority,
}

impl fmt::Display for TicketField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketField::Status => f.write_str("status"),
            TicketField::Priority => f.write_str("priority"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue {
    Status(Status),
    Priority(Priority),
}

impl FieldValue {
    pub fn parse(field: TicketField, raw: &str) -> Result<Self, TicketError> {
        match field {
            TicketField::Status => raw.parse().map(FieldValue::Status),
            TicketField::Priority => raw.parse().map(FieldValue::Priority),
        }
    }

    pub fn field(&self) -> TicketField {
        match self {
            FieldValue::Status(_) => TicketField::Status,
            FieldValue::Priority(_) => TicketField::Priority,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Status(status) => status.fmt(f),
            FieldValue::Priority(priority) => priority.fmt(f),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TicketError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Update details cannot be empty")]
    EmptyUpdate,

    #[error("Invalid {field} value: {value}")]
    InvalidValue { field: TicketField, value: String },

    #[error("Ticket {0} is already {1}")]
    Unchanged(TicketField, FieldValue),

    #[error("Technician {0} is not assigned to this ticket")]
    TechnicianNotAssigned(i64),
}

/// Identity snapshot of whoever wrote an update. Copied, not referenced, so
/// history reads the same after the account is edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: i64,
    pub username: String,
}

/// One immutable entry of a ticket's update log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub details: String,
    #[serde(rename = "technician")]
    pub author: Actor,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    #[serde(rename = "_id")]
    pub id: i64,
    pub created_by: i64,
    pub created_for_name: String,
    pub created_for_email: String,
    pub created_for_phone: Option<String>,
    pub created_for_department: Option<String>,
    pub subject: String,
    pub details: Option<String>,
    pub location: Option<String>,
    pub date_created: DateTime<Utc>,
    pub date_assigned: Option<DateTime<Utc>>,
    pub date_updated: Option<DateTime<Utc>>,
    pub date_closed: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub status: Status,
    pub technicians: Vec<i64>,
    pub updates: Vec<Update>,
}

/// Fields a submitter controls when opening a ticket. Anything else in the
/// request body (status, priority, technicians, dates, updates) is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTicket {
    pub subject: Option<String>,
    pub details: Option<String>,
    pub location: Option<String>,
    pub created_for_name: Option<String>,
    pub created_for_email: Option<String>,
    pub created_for_phone: Option<String>,
    pub created_for_department: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl NewTicket {
    /// Checks what `Ticket::open` requires, so callers can reject a draft
    /// before allocating an id for it.
    pub fn validate(&self, submitter: &User) -> Result<(), TicketError> {
        if non_blank(self.subject.clone()).is_none() {
            return Err(TicketError::MissingField("subject"));
        }
        if non_blank(self.created_for_email.clone()).is_none() && submitter.email.is_empty() {
            return Err(TicketError::MissingField("createdForEmail"));
        }
        Ok(())
    }
}

impl Ticket {
    /// Opens a new ticket on behalf of `submitter`. Contact fields default to
    /// the submitter's profile.
    pub fn open(
        id: i64,
        submitter: &User,
        draft: NewTicket,
        now: DateTime<Utc>,
    ) -> Result<Ticket, TicketError> {
        let subject = non_blank(draft.subject).ok_or(TicketError::MissingField("subject"))?;
        let created_for_name =
            non_blank(draft.created_for_name).unwrap_or_else(|| submitter.full_name());
        let created_for_email = non_blank(draft.created_for_email)
            .unwrap_or_else(|| submitter.email.clone());
        if created_for_email.is_empty() {
            return Err(TicketError::MissingField("createdForEmail"));
        }

        Ok(Ticket {
            id,
            created_by: submitter.id,
            created_for_name,
            created_for_email,
            created_for_phone: non_blank(draft.created_for_phone).or_else(|| submitter.phone.clone()),
            created_for_department: non_blank(draft.created_for_department)
                .or_else(|| submitter.department.clone()),
            subject,
            details: non_blank(draft.details),
            location: non_blank(draft.location),
            date_created: now,
            date_assigned: None,
            date_updated: None,
            date_closed: None,
            priority: Priority::default(),
            status: Status::default(),
            technicians: Vec::new(),
            updates: Vec::new(),
        })
    }

    pub fn is_assigned_to(&self, user_id: i64) -> bool {
        self.technicians.contains(&user_id)
    }

    fn append(&mut self, details: String, actor: &Actor, now: DateTime<Utc>) -> Update {
        let update = Update {
            details,
            author: actor.clone(),
            date: now,
        };
        self.updates.push(update.clone());
        self.date_updated = Some(now);
        update
    }

    /// Replaces the technician set. The list is authoritative: omitted
    /// technicians are removed, duplicates collapse, order is kept.
    pub fn assign_technicians(
        &mut self,
        technicians: &[User],
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Update {
        let mut ids: Vec<i64> = Vec::with_capacity(technicians.len());
        let mut names: Vec<String> = Vec::with_capacity(technicians.len());
        for technician in technicians {
            if !ids.contains(&technician.id) {
                ids.push(technician.id);
                names.push(technician.full_name());
            }
        }

        let was_empty = self.technicians.is_empty();
        self.technicians = ids;

        if self.technicians.is_empty() {
            if self.status == Status::Assigned {
                self.status = Status::Open;
            }
            return self.append("All technicians removed from ticket".to_string(), actor, now);
        }

        if was_empty {
            self.date_assigned = Some(now);
        }
        if self.status == Status::Open {
            self.status = Status::Assigned;
        }
        self.append(format!("Ticket assigned to {}", names.join(", ")), actor, now)
    }

    /// Removes one technician. Emptying an ASSIGNED ticket reopens it.
    pub fn remove_technician(
        &mut self,
        technician_id: i64,
        technician_name: &str,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Update, TicketError> {
        let position = self
            .technicians
            .iter()
            .position(|id| *id == technician_id)
            .ok_or(TicketError::TechnicianNotAssigned(technician_id))?;
        self.technicians.remove(position);

        if self.technicians.is_empty() && self.status == Status::Assigned {
            self.status = Status::Open;
        }
        Ok(self.append(
            format!("Technician {} removed from ticket", technician_name),
            actor,
            now,
        ))
    }

    /// Appends a free-text update. Never touches status or priority.
    pub fn post_update(
        &mut self,
        details: &str,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Update, TicketError> {
        let details = details.trim();
        if details.is_empty() {
            return Err(TicketError::EmptyUpdate);
        }
        Ok(self.append(details.to_string(), actor, now))
    }

    /// Sets status or priority. Writing the value already held is a conflict
    /// and leaves the ticket untouched.
    pub fn set_field(
        &mut self,
        value: FieldValue,
        comments: Option<&str>,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Update, TicketError> {
        match value {
            FieldValue::Status(status) => {
                if self.status == status {
                    return Err(TicketError::Unchanged(TicketField::Status, value));
                }
                self.status = status;
                self.date_closed = (status == Status::Closed).then_some(now);
            }
            FieldValue::Priority(priority) => {
                if self.priority == priority {
                    return Err(TicketError::Unchanged(TicketField::Priority, value));
                }
                self.priority = priority;
            }
        }

        let details = comments
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Ticket {} set to {}", value.field(), value));
        Ok(self.append(details, actor, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::role::Role;

    fn user(id: i64, username: &str, first: &str, last: &str, roles: Vec<Role>) -> User {
        User {
            id,
            username: username.to_string(),
            hash: None,
            roles,
            local: true,
            enabled: true,
            first_name: Some(first.to_string()),
            last_name: Some(last.to_string()),
            email: format!("{}@localhost.localdomain", username),
            phone: None,
            department: None,
        }
    }

    fn supervisor() -> Actor {
        Actor { id: 2, username: "jsmith1".into() }
    }

    fn new_ticket() -> Ticket {
        let submitter = user(6, "jojo", "Joseph", "Joestar", vec![]);
        let draft = NewTicket {
            subject: Some("Projector Malfunction".into()),
            details: Some("The projector is broken in room A220.".into()),
            ..Default::default()
        };
        Ticket::open(1, &submitter, draft, Utc::now()).unwrap()
    }

    #[test]
    fn open_applies_server_defaults() {
        let ticket = new_ticket();
        assert_eq!(ticket.status, Status::Open);
        assert_eq!(ticket.priority, Priority::Medium);
        assert!(ticket.technicians.is_empty());
        assert!(ticket.updates.is_empty());
        assert_eq!(ticket.created_by, 6);
        assert_eq!(ticket.created_for_name, "Joseph Joestar");
        assert_eq!(ticket.created_for_email, "jojo@localhost.localdomain");
    }

    #[test]
    fn open_ignores_server_controlled_fields_in_body() {
        let draft: NewTicket = serde_json::from_str(
            r#"{"subject":"Test Ticket","status":"CLOSED","priority":"HIGH","technicians":[4],"updates":[{"details":"x"}],"_id":99}"#,
        )
        .unwrap();
        let submitter = user(6, "jojo", "Joseph", "Joestar", vec![]);
        let ticket = Ticket::open(1001, &submitter, draft, Utc::now()).unwrap();
        assert_eq!(ticket.id, 1001);
        assert_eq!(ticket.status, Status::Open);
        assert_eq!(ticket.priority, Priority::Medium);
        assert!(ticket.technicians.is_empty());
        assert!(ticket.updates.is_empty());
    }

    #[test]
    fn validate_checks_draft_before_open() {
        let submitter = user(6, "jojo", "Joseph", "Joestar", vec![]);
        let blank = NewTicket { subject: Some(" ".into()), ..Default::default() };
        assert_eq!(blank.validate(&submitter), Err(TicketError::MissingField("subject")));

        let mut anonymous = submitter.clone();
        anonymous.email = String::new();
        let draft = NewTicket { subject: Some("Printer".into()), ..Default::default() };
        assert_eq!(
            draft.validate(&anonymous),
            Err(TicketError::MissingField("createdForEmail"))
        );
        assert_eq!(draft.validate(&submitter), Ok(()));
    }

    #[test]
    fn update_log_names_author_technician() {
        let mut ticket = new_ticket();
        ticket.post_update("Lamp replaced", &supervisor(), Utc::now()).unwrap();
        let value = serde_json::to_value(&ticket).unwrap();
        assert_eq!(value["updates"][0]["technician"]["username"], "jsmith1");
        assert!(value["updates"][0].get("author").is_none());
    }

    #[test]
    fn open_requires_subject() {
        let submitter = user(6, "jojo", "Joseph", "Joestar", vec![]);
        let draft = NewTicket { subject: Some("   ".into()), ..Default::default() };
        assert_eq!(
            Ticket::open(1, &submitter, draft, Utc::now()),
            Err(TicketError::MissingField("subject"))
        );
    }

    #[test]
    fn first_assignment_moves_open_to_assigned() {
        let mut ticket = new_ticket();
        let jjim = user(4, "jjim", "Jimmy", "Jim", vec![Role::Technician]);
        let update = ticket.assign_technicians(&[jjim.clone(), jjim], &supervisor(), Utc::now());
        assert_eq!(ticket.status, Status::Assigned);
        assert_eq!(ticket.technicians, vec![4]);
        assert!(ticket.date_assigned.is_some());
        assert_eq!(update.details, "Ticket assigned to Jimmy Jim");
        assert_eq!(ticket.updates.len(), 1);
    }

    #[test]
    fn assignment_leaves_other_statuses_alone() {
        let jjim = user(4, "jjim", "Jimmy", "Jim", vec![Role::Technician]);
        for status in [Status::Assigned, Status::OnHold, Status::Completed] {
            let mut ticket = new_ticket();
            ticket.status = status;
            ticket.assign_technicians(&[jjim.clone()], &supervisor(), Utc::now());
            assert_eq!(ticket.status, status);
        }
    }

    #[test]
    fn emptying_the_set_reopens_assigned_ticket() {
        let mut ticket = new_ticket();
        let jjim = user(4, "jjim", "Jimmy", "Jim", vec![Role::Technician]);
        ticket.assign_technicians(&[jjim], &supervisor(), Utc::now());
        let update = ticket.assign_technicians(&[], &supervisor(), Utc::now());
        assert_eq!(ticket.status, Status::Open);
        assert_eq!(update.details, "All technicians removed from ticket");
        assert_eq!(ticket.updates.len(), 2);
    }

    #[test]
    fn removing_last_technician_reopens_assigned_ticket() {
        let mut ticket = new_ticket();
        let jjim = user(4, "jjim", "Jimmy", "Jim", vec![Role::Technician]);
        let blee = user(5, "blee", "Bob", "Lee", vec![Role::Technician]);
        ticket.assign_technicians(&[jjim, blee], &supervisor(), Utc::now());

        ticket.remove_technician(4, "Jimmy Jim", &supervisor(), Utc::now()).unwrap();
        assert_eq!(ticket.status, Status::Assigned);
        ticket.remove_technician(5, "Bob Lee", &supervisor(), Utc::now()).unwrap();
        assert_eq!(ticket.status, Status::Open);
        assert!(ticket.technicians.is_empty());
    }

    #[test]
    fn removing_unassigned_technician_is_not_found() {
        let mut ticket = new_ticket();
        assert_eq!(
            ticket.remove_technician(4, "Jimmy Jim", &supervisor(), Utc::now()),
            Err(TicketError::TechnicianNotAssigned(4))
        );
        assert!(ticket.updates.is_empty());
    }

    #[test]
    fn removing_from_onhold_ticket_keeps_status() {
        let mut ticket = new_ticket();
        let jjim = user(4, "jjim", "Jimmy", "Jim", vec![Role::Technician]);
        ticket.assign_technicians(&[jjim], &supervisor(), Utc::now());
        ticket.status = Status::OnHold;
        ticket.remove_technician(4, "Jimmy Jim", &supervisor(), Utc::now()).unwrap();
        assert_eq!(ticket.status, Status::OnHold);
    }

    #[test]
    fn post_update_appends_and_stamps() {
        let mut ticket = new_ticket();
        let tech = Actor { id: 4, username: "jjim".into() };
        let update = ticket
            .post_update("Work order completed.", &tech, Utc::now())
            .unwrap();
        assert_eq!(update.author, tech);
        assert_eq!(ticket.updates, vec![update]);
        assert!(ticket.date_updated.is_some());
        assert_eq!(ticket.status, Status::Open);
        assert_eq!(ticket.post_update("  ", &tech, Utc::now()), Err(TicketError::EmptyUpdate));
    }

    #[test]
    fn set_field_synthesizes_details() {
        let mut ticket = new_ticket();
        let update = ticket
            .set_field(FieldValue::Priority(Priority::High), None, &supervisor(), Utc::now())
            .unwrap();
        assert_eq!(update.details, "Ticket priority set to HIGH");
        assert_eq!(ticket.priority, Priority::High);

        let update = ticket
            .set_field(
                FieldValue::Status(Status::Closed),
                Some("Replaced the lamp"),
                &supervisor(),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(update.details, "Replaced the lamp");
        assert!(ticket.date_closed.is_some());

        ticket
            .set_field(FieldValue::Status(Status::Open), None, &supervisor(), Utc::now())
            .unwrap();
        assert!(ticket.date_closed.is_none());
    }

    #[test]
    fn setting_current_value_is_rejected_without_log_entry() {
        let mut ticket = new_ticket();
        let err = ticket
            .set_field(FieldValue::Status(Status::Open), None, &supervisor(), Utc::now())
            .unwrap_err();
        assert_eq!(err, TicketError::Unchanged(TicketField::Status, FieldValue::Status(Status::Open)));
        assert_eq!(err.to_string(), "Ticket status is already OPEN");
        let err = ticket
            .set_field(FieldValue::Priority(Priority::Medium), None, &supervisor(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, TicketError::Unchanged(TicketField::Priority, _)));
        assert!(ticket.updates.is_empty());
        assert!(ticket.date_updated.is_none());
    }

    #[test]
    fn parses_field_values() {
        assert_eq!(
            FieldValue::parse(TicketField::Status, "ONHOLD"),
            Ok(FieldValue::Status(Status::OnHold))
        );
        assert!(FieldValue::parse(TicketField::Priority, "URGENT").is_err());
        assert_eq!(serde_json::to_string(&Status::OnHold).unwrap(), "\"ONHOLD\"");
    }
}
