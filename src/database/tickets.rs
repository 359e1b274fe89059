use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;

use super::manager::DatabaseError;
use super::repository::PgStore;
use super::TicketStore;
use crate::models::{Ticket, Update};

const TICKET_COLUMNS: &str = "id, created_by, created_for_name, created_for_email, \
    created_for_phone, created_for_department, subject, details, location, date_created, \
    date_assigned, date_updated, date_closed, priority, status, technicians, updates";

// Subject outranks details, which outrank the update log.
const DOCUMENT_VECTOR: &str = "setweight(to_tsvector('english', subject), 'A') \
    || setweight(to_tsvector('english', coalesce(details, '')), 'B') \
    || setweight(to_tsvector('english', coalesce(jsonb_path_query_array(updates, '$[*].details')::text, '')), 'D')";

#[derive(Debug, FromRow)]
struct TicketRow {
    id: i64,
    created_by: i64,
    created_for_name: String,
    created_for_email: String,
    created_for_phone: Option<String>,
    created_for_department: Option<String>,
    subject: String,
    details: Option<String>,
    location: Option<String>,
    date_created: DateTime<Utc>,
    date_assigned: Option<DateTime<Utc>>,
    date_updated: Option<DateTime<Utc>>,
    date_closed: Option<DateTime<Utc>>,
    priority: String,
    status: String,
    technicians: Vec<i64>,
    updates: Json<Vec<Update>>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = DatabaseError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        let corrupt = |e: crate::models::TicketError| {
            DatabaseError::Corrupt(format!("ticket {}: {}", row.id, e))
        };
        let priority = row.priority.parse().map_err(corrupt)?;
        let status = row.status.parse().map_err(corrupt)?;

        Ok(Ticket {
            id: row.id,
            created_by: row.created_by,
            created_for_name: row.created_for_name,
            created_for_email: row.created_for_email,
            created_for_phone: row.created_for_phone,
            created_for_department: row.created_for_department,
            subject: row.subject,
            details: row.details,
            location: row.location,
            date_created: row.date_created,
            date_assigned: row.date_assigned,
            date_updated: row.date_updated,
            date_closed: row.date_closed,
            priority,
            status,
            technicians: row.technicians,
            updates: row.updates.0,
        })
    }
}

fn into_tickets(rows: Vec<TicketRow>) -> Result<Vec<Ticket>, DatabaseError> {
    rows.into_iter().map(Ticket::try_from).collect()
}

impl PgStore {
    async fn select_tickets(
        &self,
        where_clause: &str,
        user_id: Option<i64>,
    ) -> Result<Vec<Ticket>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM tickets {} ORDER BY id",
            TICKET_COLUMNS, where_clause
        );
        let mut query = sqlx::query_as::<_, TicketRow>(&sql);
        if let Some(user_id) = user_id {
            query = query.bind(user_id);
        }
        into_tickets(query.fetch_all(self.pool()).await?)
    }
}

#[async_trait]
impl TicketStore for PgStore {
    async fn list(&self) -> Result<Vec<Ticket>, DatabaseError> {
        self.select_tickets("", None).await
    }

    async fn list_submitted_by(&self, user_id: i64) -> Result<Vec<Ticket>, DatabaseError> {
        self.select_tickets("WHERE created_by = $1", Some(user_id)).await
    }

    async fn list_assigned_to(&self, user_id: i64) -> Result<Vec<Ticket>, DatabaseError> {
        self.select_tickets("WHERE $1 = ANY(technicians)", Some(user_id))
            .await
    }

    async fn search(
        &self,
        query: &str,
        submitted_by: Option<i64>,
    ) -> Result<Vec<Ticket>, DatabaseError> {
        let sql = format!(
            "SELECT {columns} FROM (
                SELECT tickets.*, {document} AS document FROM tickets
             ) t, websearch_to_tsquery('english', $1) q
             WHERE t.document @@ q AND ($2::BIGINT IS NULL OR t.created_by = $2)
             ORDER BY ts_rank(t.document, q) DESC, t.id",
            columns = TICKET_COLUMNS,
            document = DOCUMENT_VECTOR,
        );
        let rows = sqlx::query_as::<_, TicketRow>(&sql)
            .bind(query)
            .bind(submitted_by)
            .fetch_all(self.pool())
            .await?;
        into_tickets(rows)
    }

    async fn find(&self, id: i64) -> Result<Option<Ticket>, DatabaseError> {
        let sql = format!("SELECT {} FROM tickets WHERE id = $1", TICKET_COLUMNS);
        sqlx::query_as::<_, TicketRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .map(Ticket::try_from)
            .transpose()
    }

    async fn insert(&self, ticket: &Ticket) -> Result<(), DatabaseError> {
        let sql = format!(
            "INSERT INTO tickets ({}) VALUES
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
            TICKET_COLUMNS
        );
        sqlx::query(&sql)
            .bind(ticket.id)
            .bind(ticket.created_by)
            .bind(&ticket.created_for_name)
            .bind(&ticket.created_for_email)
            .bind(&ticket.created_for_phone)
            .bind(&ticket.created_for_department)
            .bind(&ticket.subject)
            .bind(&ticket.details)
            .bind(&ticket.location)
            .bind(ticket.date_created)
            .bind(ticket.date_assigned)
            .bind(ticket.date_updated)
            .bind(ticket.date_closed)
            .bind(ticket.priority.as_str())
            .bind(ticket.status.as_str())
            .bind(&ticket.technicians)
            .bind(Json(&ticket.updates))
            .execute(self.pool())
            .await
            .map_err(DatabaseError::from_write)?;
        Ok(())
    }

    async fn save(&self, ticket: &Ticket) -> Result<(), DatabaseError> {
        // created_by and date_created never change after creation.
        let result = sqlx::query(
            "UPDATE tickets SET created_for_name = $2, created_for_email = $3,
                created_for_phone = $4, created_for_department = $5, subject = $6,
                details = $7, location = $8, date_assigned = $9, date_updated = $10,
                date_closed = $11, priority = $12, status = $13, technicians = $14,
                updates = $15
             WHERE id = $1",
        )
        .bind(ticket.id)
        .bind(&ticket.created_for_name)
        .bind(&ticket.created_for_email)
        .bind(&ticket.created_for_phone)
        .bind(&ticket.created_for_department)
        .bind(&ticket.subject)
        .bind(&ticket.details)
        .bind(&ticket.location)
        .bind(ticket.date_assigned)
        .bind(ticket.date_updated)
        .bind(ticket.date_closed)
        .bind(ticket.priority.as_str())
        .bind(ticket.status.as_str())
        .bind(&ticket.technicians)
        .bind(Json(&ticket.updates))
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Ticket {}", ticket.id)));
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
