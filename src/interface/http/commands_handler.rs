use axum::{
    Json,
    extract::{Path, rejection::JsonRejection},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    domain::{command::Command, errors::StoreError},
    infrastructure::CommandContext,
    interface::http::problem::{ApiError, ApiResult},
};

pub const COMMANDS_PATH: &str = "/api/commands";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn healthcheck() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn list_commands(ctx: CommandContext) -> ApiResult<Json<Vec<Command>>> {
    Ok(Json(ctx.list().await?))
}

pub async fn get_command(
    ctx: CommandContext,
    Path(id): Path<String>,
) -> ApiResult<Json<Command>> {
    let id = parse_id(&id)?;
    let Some(command) = ctx.find(id).await? else {
        return Err(ApiError::NotFound);
    };
    Ok(Json(command))
}

pub async fn create_command(
    mut ctx: CommandContext,
    payload: Result<Json<Command>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(command) = payload.map_err(reject_body)?;

    ctx.add(command);
    let receipt = match ctx.commit().await {
        Ok(receipt) => receipt,
        Err(error) => {
            warn!(error = %error, "create command rejected by store");
            return Err(ApiError::BadRequest);
        }
    };

    let created = receipt
        .inserted
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::internal("commit did not report the inserted command"))?;

    let location = format!("{COMMANDS_PATH}/{}", created.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(created),
    ))
}

/// Replaces every mutable field of the command at `id`. Existence is not
/// checked: an unknown id matches no row and still yields 204.
pub async fn update_command(
    mut ctx: CommandContext,
    Path(id): Path<String>,
    payload: Result<Json<Command>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    let Json(command) = payload.map_err(reject_body)?;

    if id != command.id {
        return Err(ApiError::BadRequest);
    }

    ctx.mark_modified(command);
    let receipt = ctx.commit().await?;
    if receipt.rows_affected == 0 {
        debug!(id, "update matched no stored command");
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_command(
    mut ctx: CommandContext,
    Path(id): Path<String>,
) -> ApiResult<Json<Command>> {
    let id = parse_id(&id)?;
    let Some(command) = ctx.find(id).await? else {
        return Err(ApiError::NotFound);
    };

    ctx.remove(&command);
    ctx.commit().await?;

    Ok(Json(command))
}

fn parse_id(raw: &str) -> ApiResult<i32> {
    raw.parse::<i32>().map_err(|_| ApiError::BadRequest)
}

fn reject_body(rejection: JsonRejection) -> ApiError {
    debug!(error = %rejection, "rejected command body");
    ApiError::BadRequest
}
