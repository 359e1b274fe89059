//! Sample data for local development and the test suite: six accounts
//! covering every role combination and three tickets submitted by `jojo`.

use chrono::{DateTime, Utc};
use tracing::info;

use super::manager::DatabaseError;
use super::{SequenceStore, TicketStore, UserStore, TICKET_ID_SEQUENCE, USER_ID_SEQUENCE};
use crate::models::{Actor, Priority, Role, Status, Ticket, Update, User};

/// Password of every fixture account.
pub const FIXTURE_PASSWORD: &str = "abcd";

/// Sequences resume after the fixture ids.
pub const FIXTURE_SEQUENCE_START: i64 = 1000;

fn account(
    id: i64,
    username: &str,
    roles: Vec<Role>,
    name: (&str, &str),
    phone: &str,
    hash: &str,
) -> User {
    User {
        id,
        username: username.to_string(),
        hash: Some(hash.to_string()),
        roles,
        local: true,
        enabled: true,
        first_name: Some(name.0.to_string()),
        last_name: Some(name.1.to_string()),
        email: format!("{}@localhost.localdomain", username),
        phone: Some(phone.to_string()),
        department: None,
    }
}

/// `hash` is the stored password hash shared by all accounts.
pub fn sample_users(hash: &str) -> Vec<User> {
    vec![
        account(1, "techit", vec![Role::Admin], ("Admin", "System"), "323-343-1234", hash),
        account(2, "jsmith1", vec![Role::Supervisor], ("John", "Smith"), "323-343-2345", hash),
        account(
            3,
            "jsmith2",
            vec![Role::Technician, Role::Supervisor],
            ("Jane", "Smith"),
            "323-343-3456",
            hash,
        ),
        account(4, "jjim", vec![Role::Technician], ("Jimmy", "Jim"), "323-343-4567", hash),
        account(5, "blee", vec![Role::Technician], ("Bob", "Lee"), "323-343-5678", hash),
        account(6, "jojo", vec![], ("Joseph", "Joestar"), "323-343-6789", hash),
    ]
}

fn submitted_by_jojo(id: i64, subject: &str, details: &str, now: DateTime<Utc>) -> Ticket {
    Ticket {
        id,
        created_by: 6,
        created_for_name: "Joseph Joestar".to_string(),
        created_for_email: "jojo@localhost.localdomain".to_string(),
        created_for_phone: None,
        created_for_department: None,
        subject: subject.to_string(),
        details: Some(details.to_string()),
        location: None,
        date_created: now,
        date_assigned: None,
        date_updated: None,
        date_closed: None,
        priority: Priority::Medium,
        status: Status::Open,
        technicians: vec![],
        updates: vec![],
    }
}

pub fn sample_tickets(now: DateTime<Utc>) -> Vec<Ticket> {
    let mut lab = submitted_by_jojo(
        3,
        "ME Lab Improvements",
        "Update testing equipment in the ME lab.",
        now,
    );
    lab.status = Status::Assigned;
    lab.technicians = vec![4];
    lab.date_assigned = Some(now);
    lab.date_updated = Some(now);
    lab.updates = vec![
        Update {
            details: "Ticket assigned to Jimmy Jim".to_string(),
            author: Actor { id: 2, username: "jsmith1".to_string() },
            date: now,
        },
        Update {
            details: "Work order completed. Waiting approval by supervisor.".to_string(),
            author: Actor { id: 4, username: "jjim".to_string() },
            date: now,
        },
    ];

    vec![
        submitted_by_jojo(
            1,
            "Projector Malfunction",
            "The projector is broken in room A220.",
            now,
        ),
        submitted_by_jojo(
            2,
            "Senior Design 2018 Equipment Request",
            "One of the EE senior design projects needs some equipment.",
            now,
        ),
        lab,
    ]
}

/// Inserts the sample accounts and tickets and parks both sequences at
/// `FIXTURE_SEQUENCE_START`. Expects empty stores.
pub async fn load(
    users: &dyn UserStore,
    tickets: &dyn TicketStore,
    sequences: &dyn SequenceStore,
    hash: &str,
) -> Result<(), DatabaseError> {
    let sample_users = sample_users(hash);
    for user in &sample_users {
        users.insert(user).await?;
    }

    let sample_tickets = sample_tickets(Utc::now());
    for ticket in &sample_tickets {
        tickets.insert(ticket).await?;
    }

    for name in [USER_ID_SEQUENCE, TICKET_ID_SEQUENCE] {
        sequences.seed(name, FIXTURE_SEQUENCE_START).await?;
    }

    info!(
        "Loaded fixture: {} users, {} tickets",
        sample_users.len(),
        sample_tickets.len()
    );
    Ok(())
}
