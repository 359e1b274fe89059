//! Ticket mail notifications.
//!
//! Handlers push a [`TicketEvent`] and return immediately. A single
//! background worker resolves recipients, renders the mail and hands it to
//! the [`Mailer`]. Failures are logged and dropped: no retries, no queue
//! persistence.

pub mod mailer;

use std::sync::Arc;

use futures::try_join;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::database::{DatabaseError, UserStore};
use crate::models::{Role, Ticket, Update, User};

pub use mailer::{LogMailer, Mail, MailError, Mailer, SmtpMailer};

#[derive(Debug, Clone)]
pub enum TicketEvent {
    Created { ticket: Ticket, actor: User },
    Updated { ticket: Ticket, actor: User, update: Update },
}

impl TicketEvent {
    pub fn ticket(&self) -> &Ticket {
        match self {
            TicketEvent::Created { ticket, .. } | TicketEvent::Updated { ticket, .. } => ticket,
        }
    }

    pub fn actor(&self) -> &User {
        match self {
            TicketEvent::Created { actor, .. } | TicketEvent::Updated { actor, .. } => actor,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            TicketEvent::Created { .. } => "created",
            TicketEvent::Updated { .. } => "updated",
        }
    }
}

/// Handle for queuing notifications. Cloned into the application state; the
/// worker exits once every clone is dropped and the queue is drained.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<TicketEvent>,
}

impl Notifier {
    pub fn spawn(
        users: Arc<dyn UserStore>,
        mailer: Arc<dyn Mailer>,
        app_url: String,
    ) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<TicketEvent>();

        let worker = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                dispatch(users.as_ref(), mailer.as_ref(), &app_url, &event).await;
            }
            info!("Notification worker stopped");
        });

        (Self { tx }, worker)
    }

    /// Queues `event` without waiting for delivery.
    pub fn notify(&self, event: TicketEvent) {
        let id = event.ticket().id;
        if self.tx.send(event).is_err() {
            warn!("Notification worker gone; dropping notice for ticket {}", id);
        }
    }
}

async fn dispatch(users: &dyn UserStore, mailer: &dyn Mailer, app_url: &str, event: &TicketEvent) {
    let ticket_id = event.ticket().id;
    let kind = event.kind();

    let bcc = match recipients(users, event).await {
        Ok(bcc) => bcc,
        Err(e) => {
            error!("Failed to resolve recipients for ticket {} {}: {}", ticket_id, kind, e);
            return;
        }
    };
    if bcc.is_empty() {
        info!("No recipients for ticket {} {}", ticket_id, kind);
        return;
    }

    let mail = render(event, bcc, app_url);
    match mailer.send(&mail).await {
        Ok(()) => info!("Ticket {} {} email sent to {}", ticket_id, kind, mail.bcc.join(", ")),
        Err(e) => error!("Failed to send ticket {} {} email: {}", ticket_id, kind, e),
    }
}

/// Created: every supervisor-tier user. Updated: supervisors, the assigned
/// technicians and the submitter, minus whoever made the change.
pub async fn recipients(
    users: &dyn UserStore,
    event: &TicketEvent,
) -> Result<Vec<String>, DatabaseError> {
    match event {
        TicketEvent::Created { .. } => {
            let supervisors = users.list_at_least(Role::Supervisor).await?;
            Ok(collect_recipients(supervisors.iter().map(|u| u.email.as_str()), None))
        }
        TicketEvent::Updated { ticket, actor, .. } => {
            let (supervisors, technicians, submitter) = try_join!(
                users.list_at_least(Role::Supervisor),
                users.find_many(&ticket.technicians),
                users.find(ticket.created_by),
            )?;
            let emails = supervisors
                .iter()
                .chain(technicians.iter())
                .chain(submitter.iter())
                .map(|u| u.email.as_str());
            Ok(collect_recipients(emails, Some(&actor.email)))
        }
    }
}

/// Lower-cases, drops blanks and duplicates (first occurrence wins) and
/// removes `exclude`.
pub fn collect_recipients<'a>(
    emails: impl IntoIterator<Item = &'a str>,
    exclude: Option<&str>,
) -> Vec<String> {
    let exclude = exclude.map(|e| e.trim().to_lowercase());
    let mut out: Vec<String> = Vec::new();
    for email in emails {
        let email = email.trim().to_lowercase();
        if email.is_empty() || exclude.as_deref() == Some(email.as_str()) || out.contains(&email) {
            continue;
        }
        out.push(email);
    }
    out
}

pub fn render(event: &TicketEvent, bcc: Vec<String>, app_url: &str) -> Mail {
    let ticket = event.ticket();
    let actor = event.actor();
    let link = format!("{}/tickets/{}", app_url.trim_end_matches('/'), ticket.id);
    let when = chrono::Utc::now().format("%m/%d/%Y");

    let subject = format!("[TechIT] Ticket #{} {}: {}", ticket.id, event.kind(), ticket.subject);

    let mut body = match event {
        TicketEvent::Created { .. } => format!(
            "A new ticket was submitted by {} on {}.\n\n\
             Subject: {}\n\
             Requested for: {} <{}>\n",
            actor.full_name(),
            when,
            ticket.subject,
            ticket.created_for_name,
            ticket.created_for_email,
        ),
        TicketEvent::Updated { update, .. } => format!(
            "Ticket #{} was updated by {} on {}.\n\n{}\n\n\
             Subject: {}\n",
            ticket.id,
            actor.full_name(),
            when,
            update.details,
            ticket.subject,
        ),
    };
    if let Some(details) = &ticket.details {
        body.push_str(&format!("Details: {}\n", details));
    }
    body.push_str(&format!(
        "Status: {}\nPriority: {}\n\nView the ticket at {}\n",
        ticket.status, ticket.priority, link
    ));

    Mail { bcc, subject, body }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{fixture, MemoryStore};
    use chrono::Utc;

    async fn store() -> MemoryStore {
        let store = MemoryStore::new();
        fixture::load(&store, &store, &store, "hash").await.unwrap();
        store
    }

    async fn user(store: &MemoryStore, id: i64) -> User {
        UserStore::find(store, id).await.unwrap().unwrap()
    }

    fn lab_ticket() -> Ticket {
        fixture::sample_tickets(Utc::now()).remove(2)
    }

    #[test]
    fn collect_dedupes_and_excludes() {
        let emails = ["A@x.io", "b@x.io", "a@x.io", " ", "C@x.io"];
        assert_eq!(
            collect_recipients(emails, Some("c@X.io")),
            vec!["a@x.io".to_string(), "b@x.io".to_string()]
        );
    }

    #[tokio::test]
    async fn created_goes_to_supervisors() {
        let store = store().await;
        let event = TicketEvent::Created {
            ticket: lab_ticket(),
            actor: user(&store, 6).await,
        };
        assert_eq!(
            recipients(&store, &event).await.unwrap(),
            vec![
                "techit@localhost.localdomain",
                "jsmith1@localhost.localdomain",
                "jsmith2@localhost.localdomain",
            ]
        );
    }

    #[tokio::test]
    async fn updated_adds_technicians_and_submitter_but_not_actor() {
        let store = store().await;
        let ticket = lab_ticket();
        let update = ticket.updates[1].clone();
        let event = TicketEvent::Updated {
            ticket,
            actor: user(&store, 2).await,
            update,
        };
        assert_eq!(
            recipients(&store, &event).await.unwrap(),
            vec![
                "techit@localhost.localdomain",
                "jsmith2@localhost.localdomain",
                "jjim@localhost.localdomain",
                "jojo@localhost.localdomain",
            ]
        );
    }

    #[tokio::test]
    async fn render_links_to_ticket() {
        let store = store().await;
        let event = TicketEvent::Created {
            ticket: lab_ticket(),
            actor: user(&store, 6).await,
        };
        let mail = render(&event, vec!["x@y.z".into()], "http://localhost:3000/");
        assert_eq!(mail.subject, "[TechIT] Ticket #3 created: ME Lab Improvements");
        assert!(mail.body.contains("http://localhost:3000/tickets/3"));
        assert!(mail.body.contains("Joseph Joestar"));
    }
}
