pub use entity::{email_log, prelude::*, user};
pub use sea_orm::{
    sea_query::Expr, sqlx, ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait,
    DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, RuntimeErr, Schema,
    TransactionTrait,
};
