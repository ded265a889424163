use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::entities::{customer, message, MessageModel};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Clone)]
pub struct MessageService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl MessageService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, body))]
    pub async fn send(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
        order_id: Option<Uuid>,
        body: String,
    ) -> Result<MessageModel, ServiceError> {
        if body.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "message body must not be empty".to_string(),
            ));
        }
        customer::Entity::find_by_id(recipient_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Recipient {recipient_id} not found")))?;

        let created = message::ActiveModel {
            id: Set(Uuid::new_v4()),
            sender_id: Set(sender_id),
            recipient_id: Set(recipient_id),
            order_id: Set(order_id),
            body: Set(body),
            is_read: Set(false),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::MessageSent {
                message_id: created.id,
                recipient_id,
            })
            .await;
        Ok(created)
    }

    /// Both directions of a conversation, oldest first.
    #[instrument(skip(self))]
    pub async fn conversation(
        &self,
        a: Uuid,
        b: Uuid,
    ) -> Result<Vec<MessageModel>, ServiceError> {
        Ok(message::Entity::find()
            .filter(
                Condition::any()
                    .add(
                        Condition::all()
                            .add(message::Column::SenderId.eq(a))
                            .add(message::Column::RecipientId.eq(b)),
                    )
                    .add(
                        Condition::all()
                            .add(message::Column::SenderId.eq(b))
                            .add(message::Column::RecipientId.eq(a)),
                    ),
            )
            .order_by_asc(message::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Marks a received message as read; only the recipient may do so.
    #[instrument(skip(self))]
    pub async fn mark_read(&self, id: Uuid, reader_id: Uuid) -> Result<MessageModel, ServiceError> {
        let existing = message::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Message {id} not found")))?;
        if existing.recipient_id != reader_id {
            return Err(ServiceError::Forbidden(
                "only the recipient can mark a message read".to_string(),
            ));
        }

        let mut update: message::ActiveModel = existing.into();
        update.is_read = Set(true);
        Ok(update.update(&*self.db).await?)
    }
}
