use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{db_core::prelude::*, error::AppResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStats {
    pub total_moved_to_gator: i32,
    pub total_emails_processed: u64,
    pub email: String,
}

pub struct UsageCtrl;

impl UsageCtrl {
    /// Create the `users` and `email_logs` tables when they do not exist yet.
    pub async fn init_schema(conn: &DatabaseConnection) -> AppResult<()> {
        let backend = conn.get_database_backend();
        let schema = Schema::new(backend);

        let mut users = schema.create_table_from_entity(User);
        users.if_not_exists();
        conn.execute(backend.build(&users)).await?;

        let mut email_logs = schema.create_table_from_entity(EmailLog);
        email_logs.if_not_exists();
        conn.execute(backend.build(&email_logs)).await?;

        tracing::info!("Database schema ready");
        Ok(())
    }

    pub async fn get_by_email<C: ConnectionTrait>(
        conn: &C,
        email: &str,
    ) -> AppResult<Option<user::Model>> {
        let user = User::find()
            .filter(user::Column::Email.eq(email))
            .one(conn)
            .await
            .context("Error fetching user by email")?;

        Ok(user)
    }

    pub async fn get_or_create_user<C: ConnectionTrait>(
        conn: &C,
        email: &str,
    ) -> AppResult<user::Model> {
        if let Some(user) = Self::get_by_email(conn, email).await? {
            return Ok(user);
        }

        let active_model = user::ActiveModel {
            id: ActiveValue::NotSet,
            email: ActiveValue::Set(email.to_string()),
            total_moved_to_gator: ActiveValue::Set(0),
            created_at: ActiveValue::Set(chrono::Utc::now().into()),
        };

        match User::insert(active_model).exec(conn).await {
            Ok(_) => tracing::info!("Created user {}", email),
            // lost a race with another request creating the same user
            Err(DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(db_err))))
                if db_err.is_unique_violation() => {}
            Err(DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(db_err))))
                if db_err.is_unique_violation() => {}
            Err(e) => Err(e).context("Error creating user")?,
        }

        Self::get_by_email(conn, email)
            .await?
            .context("User missing after insert")
            .map_err(Into::into)
    }

    /// Record one processed email for `email`, creating the user on first
    /// sight. Runs in a single transaction.
    pub async fn log_email_activity(
        conn: &DatabaseConnection,
        email: &str,
        message_id: &str,
        moved_to_gator: bool,
    ) -> AppResult<()> {
        let txn = conn.begin().await?;

        let user = Self::get_or_create_user(&txn, email).await?;

        email_log::ActiveModel {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::Set(user.id),
            message_id: ActiveValue::Set(message_id.to_string()),
            moved_to_gator: ActiveValue::Set(moved_to_gator),
            created_at: ActiveValue::Set(chrono::Utc::now().into()),
        }
        .insert(&txn)
        .await
        .context("Error inserting email log")?;

        if moved_to_gator {
            User::update_many()
                .col_expr(
                    user::Column::TotalMovedToGator,
                    Expr::col(user::Column::TotalMovedToGator).add(1),
                )
                .filter(user::Column::Id.eq(user.id))
                .exec(&txn)
                .await
                .context("Error updating moved count")?;
        }

        txn.commit().await?;
        tracing::debug!("Logged activity for {} on {}", email, message_id);

        Ok(())
    }

    pub async fn get_stats(conn: &DatabaseConnection, email: &str) -> AppResult<UsageStats> {
        let user = Self::get_or_create_user(conn, email).await?;
        let total_emails_processed = EmailLog::find()
            .filter(email_log::Column::UserId.eq(user.id))
            .count(conn)
            .await
            .context("Error counting email logs")?;

        Ok(UsageStats {
            total_moved_to_gator: user.total_moved_to_gator,
            total_emails_processed,
            email: user.email,
        })
    }
}
