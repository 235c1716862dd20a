use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::{map_reference_error, require, require_if_present};
use crate::error::{AppError, AppResult};
use crate::models::Property;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProperty {
    pub organization_id: Uuid,
    pub name: String,
    pub address: String,
    #[serde(rename = "type")]
    pub property_type: String,
    pub subtype: String,
    pub management_model: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub size_sq_ft: i32,
    pub class: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProperty {
    pub organization_id: Option<Uuid>,
    pub name: Option<String>,
    pub address: Option<String>,
    #[serde(rename = "type")]
    pub property_type: Option<String>,
    pub subtype: Option<String>,
    pub management_model: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub size_sq_ft: Option<i32>,
    pub class: Option<String>,
}

impl CreateProperty {
    fn validate(&self) -> AppResult<()> {
        require("name", &self.name)?;
        require("address", &self.address)?;
        require("type", &self.property_type)?;
        validate_size(Some(self.size_sq_ft))
    }
}

impl UpdateProperty {
    fn validate(&self) -> AppResult<()> {
        require_if_present("name", self.name.as_deref())?;
        require_if_present("address", self.address.as_deref())?;
        require_if_present("type", self.property_type.as_deref())?;
        validate_size(self.size_sq_ft)
    }
}

fn validate_size(size_sq_ft: Option<i32>) -> AppResult<()> {
    match size_sq_ft {
        Some(size) if size < 0 => Err(AppError::InvalidInput(
            "sizeSqFt must not be negative".to_string(),
        )),
        _ => Ok(()),
    }
}

pub struct PropertyServiceImpl {
    pool: PgPool,
}

impl PropertyServiceImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, req: CreateProperty) -> AppResult<Property> {
        req.validate()?;

        sqlx::query_as::<_, Property>(
            "INSERT INTO properties
                 (organization_id, name, address, property_type, subtype, management_model,
                  city, state, country, size_sq_ft, class)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING *",
        )
        .bind(req.organization_id)
        .bind(&req.name)
        .bind(&req.address)
        .bind(&req.property_type)
        .bind(&req.subtype)
        .bind(&req.management_model)
        .bind(&req.city)
        .bind(&req.state)
        .bind(&req.country)
        .bind(req.size_sq_ft)
        .bind(&req.class)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_reference_error(e, "organization"))
    }

    pub async fn find_all(&self, organization_id: Option<Uuid>) -> AppResult<Vec<Property>> {
        let rows = sqlx::query_as::<_, Property>(
            "SELECT * FROM properties
             WHERE ($1::uuid IS NULL OR organization_id = $1)
             ORDER BY created_at",
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_one(&self, id: Uuid) -> AppResult<Property> {
        sqlx::query_as::<_, Property>("SELECT * FROM properties WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Property with ID {} not found", id)))
    }

    pub async fn update(&self, id: Uuid, req: UpdateProperty) -> AppResult<Property> {
        req.validate()?;

        sqlx::query_as::<_, Property>(
            "UPDATE properties SET
                 organization_id = COALESCE($2, organization_id),
                 name = COALESCE($3, name),
                 address = COALESCE($4, address),
                 property_type = COALESCE($5, property_type),
                 subtype = COALESCE($6, subtype),
                 management_model = COALESCE($7, management_model),
                 city = COALESCE($8, city),
                 state = COALESCE($9, state),
                 country = COALESCE($10, country),
                 size_sq_ft = COALESCE($11, size_sq_ft),
                 class = COALESCE($12, class),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(req.organization_id)
        .bind(&req.name)
        .bind(&req.address)
        .bind(&req.property_type)
        .bind(&req.subtype)
        .bind(&req.management_model)
        .bind(&req.city)
        .bind(&req.state)
        .bind(&req.country)
        .bind(req.size_sq_ft)
        .bind(&req.class)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_reference_error(e, "organization"))?
        .ok_or_else(|| AppError::NotFound(format!("Property with ID {} not found", id)))
    }

    pub async fn remove(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM properties WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Property with ID {} not found",
                id
            )));
        }
        Ok(())
    }
}
