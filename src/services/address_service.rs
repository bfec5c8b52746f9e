//! Address Service - Shipping addresses owned by customers
//!
//! Each user has at most one default address. The first address a user
//! saves becomes the default, and deleting the default promotes the oldest
//! remaining one.

use sea_orm::sea_query::Expr;
use sea_orm::*;
use serde::Deserialize;

use crate::domain::DomainError;
use crate::domain::validation::{optional_text, required_name};
use crate::models::address::{self, Entity as Address};
use crate::models::timestamp;

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct AddressInput {
    pub recipient_name: String,
    pub phone: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: String,
    #[serde(default)]
    pub is_default: bool,
}

pub async fn list_addresses(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<address::Model>, DomainError> {
    Ok(Address::find()
        .filter(address::Column::UserId.eq(user_id))
        .order_by_desc(address::Column::IsDefault)
        .order_by_asc(address::Column::Id)
        .all(db)
        .await?)
}

/// Fetch an address, hiding other users' addresses behind a 404.
pub async fn get_owned<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    id: i32,
) -> Result<address::Model, DomainError> {
    Address::find_by_id(id)
        .filter(address::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Address"))
}

async fn clear_default<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<(), DomainError> {
    Address::update_many()
        .col_expr(address::Column::IsDefault, Expr::value(false))
        .filter(address::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(())
}

struct CleanAddress {
    recipient_name: String,
    phone: String,
    line1: String,
    line2: Option<String>,
    city: String,
    state: Option<String>,
    postal_code: Option<String>,
    country: String,
}

fn clean(input: AddressInput) -> Result<CleanAddress, DomainError> {
    Ok(CleanAddress {
        recipient_name: required_name("Recipient name", &input.recipient_name)?,
        phone: required_name("Phone", &input.phone)?,
        line1: required_name("Address line", &input.line1)?,
        line2: optional_text(input.line2),
        city: required_name("City", &input.city)?,
        state: optional_text(input.state),
        postal_code: optional_text(input.postal_code),
        country: required_name("Country", &input.country)?,
    })
}

pub async fn create_address(
    db: &DatabaseConnection,
    user_id: i32,
    input: AddressInput,
) -> Result<address::Model, DomainError> {
    let wants_default = input.is_default;
    let fields = clean(input)?;

    let txn = db.begin().await?;
    let existing = Address::find()
        .filter(address::Column::UserId.eq(user_id))
        .count(&txn)
        .await?;
    let is_default = wants_default || existing == 0;
    if is_default {
        clear_default(&txn, user_id).await?;
    }

    let now = timestamp();
    let model = address::ActiveModel {
        user_id: Set(user_id),
        recipient_name: Set(fields.recipient_name),
        phone: Set(fields.phone),
        line1: Set(fields.line1),
        line2: Set(fields.line2),
        city: Set(fields.city),
        state: Set(fields.state),
        postal_code: Set(fields.postal_code),
        country: Set(fields.country),
        is_default: Set(is_default),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(model)
}

pub async fn update_address(
    db: &DatabaseConnection,
    user_id: i32,
    id: i32,
    input: AddressInput,
) -> Result<address::Model, DomainError> {
    let wants_default = input.is_default;
    let fields = clean(input)?;

    let txn = db.begin().await?;
    let existing = get_owned(&txn, user_id, id).await?;
    let keep_default = existing.is_default;
    if wants_default && !keep_default {
        clear_default(&txn, user_id).await?;
    }

    let mut active: address::ActiveModel = existing.into();
    active.recipient_name = Set(fields.recipient_name);
    active.phone = Set(fields.phone);
    active.line1 = Set(fields.line1);
    active.line2 = Set(fields.line2);
    active.city = Set(fields.city);
    active.state = Set(fields.state);
    active.postal_code = Set(fields.postal_code);
    active.country = Set(fields.country);
    // Unsetting the default directly is not allowed; pick another default instead
    active.is_default = Set(keep_default || wants_default);
    active.updated_at = Set(timestamp());
    let updated = active.update(&txn).await?;

    txn.commit().await?;
    Ok(updated)
}

pub async fn set_default(
    db: &DatabaseConnection,
    user_id: i32,
    id: i32,
) -> Result<address::Model, DomainError> {
    let txn = db.begin().await?;
    let existing = get_owned(&txn, user_id, id).await?;
    clear_default(&txn, user_id).await?;

    let mut active: address::ActiveModel = existing.into();
    active.is_default = Set(true);
    active.updated_at = Set(timestamp());
    let updated = active.update(&txn).await?;

    txn.commit().await?;
    Ok(updated)
}

pub async fn delete_address(
    db: &DatabaseConnection,
    user_id: i32,
    id: i32,
) -> Result<(), DomainError> {
    let txn = db.begin().await?;
    let existing = get_owned(&txn, user_id, id).await?;
    let was_default = existing.is_default;
    existing.delete(&txn).await?;

    if was_default
        && let Some(next) = Address::find()
            .filter(address::Column::UserId.eq(user_id))
            .order_by_asc(address::Column::Id)
            .one(&txn)
            .await?
    {
        let mut active: address::ActiveModel = next.into();
        active.is_default = Set(true);
        active.update(&txn).await?;
    }

    txn.commit().await?;
    Ok(())
}
