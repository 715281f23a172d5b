use super::*;

use markops_application::{
    CampaignUpdateInput, CreateCampaignInput, NewCampaignAssignment, RecordMetricInput,
};
use markops_domain::{CampaignStatus, CampaignType};

pub async fn create_campaign_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreateCampaignRequest>,
) -> ApiResult<(StatusCode, Json<CampaignResponse>)> {
    let campaign = state
        .campaign_service
        .create_campaign(CreateCampaignInput {
            name: payload.name,
            description: payload.description,
            campaign_type: payload.campaign_type.parse::<CampaignType>()?,
            budget_cents: payload.budget_cents,
            start_date: parse_timestamp(&payload.start_date, "start_date")?,
            end_date: parse_timestamp(&payload.end_date, "end_date")?,
            owner_id: UserId::from_uuid(user.user_id()),
            tags: payload.tags,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(CampaignResponse::from(&campaign))))
}

pub async fn list_campaigns_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<CampaignResponse>>> {
    let campaigns = state
        .campaign_service
        .list_campaigns()
        .await?
        .iter()
        .map(CampaignResponse::from)
        .collect();

    Ok(Json(campaigns))
}

pub async fn get_campaign_handler(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
) -> ApiResult<Json<CampaignResponse>> {
    let campaign = state.campaign_service.get_campaign(campaign_id).await?;
    Ok(Json(CampaignResponse::from(&campaign)))
}

pub async fn update_campaign_handler(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
    Json(payload): Json<UpdateCampaignRequest>,
) -> ApiResult<Json<CampaignResponse>> {
    let start_date = payload
        .start_date
        .as_deref()
        .map(|value| parse_timestamp(value, "start_date"))
        .transpose()?;
    let end_date = payload
        .end_date
        .as_deref()
        .map(|value| parse_timestamp(value, "end_date"))
        .transpose()?;

    let campaign = state
        .campaign_service
        .update_campaign(
            campaign_id,
            CampaignUpdateInput {
                name: payload.name,
                description: payload.description,
                budget_cents: payload.budget_cents,
                start_date,
                end_date,
                tags: payload.tags,
            },
        )
        .await?;

    Ok(Json(CampaignResponse::from(&campaign)))
}

pub async fn delete_campaign_handler(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.campaign_service.delete_campaign(campaign_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_campaign_status_handler(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
    Json(payload): Json<UpdateCampaignStatusRequest>,
) -> ApiResult<Json<CampaignResponse>> {
    let next = payload.status.parse::<CampaignStatus>()?;
    let campaign = state
        .campaign_service
        .update_status(campaign_id, next)
        .await?;

    Ok(Json(CampaignResponse::from(&campaign)))
}

/// Activates a draft or paused campaign. Mapped to the APPROVE action
/// by the request classifier.
pub async fn approve_campaign_handler(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
) -> ApiResult<Json<CampaignResponse>> {
    let campaign = state
        .campaign_service
        .update_status(campaign_id, CampaignStatus::Active)
        .await?;

    Ok(Json(CampaignResponse::from(&campaign)))
}

/// Bundles a campaign with its aggregated metrics. Mapped to the
/// EXPORT action by the request classifier.
pub async fn export_campaign_handler(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
) -> ApiResult<Json<CampaignExportResponse>> {
    let campaign = state.campaign_service.get_campaign(campaign_id).await?;
    let summary = state.campaign_service.metrics_summary(campaign_id).await?;

    Ok(Json(CampaignExportResponse {
        campaign: CampaignResponse::from(&campaign),
        metrics: MetricsSummaryResponse::from(&summary),
    }))
}

pub async fn list_assignments_handler(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
) -> ApiResult<Json<Vec<AssignmentResponse>>> {
    let assignments = state
        .campaign_service
        .list_assignments(campaign_id)
        .await?
        .iter()
        .map(AssignmentResponse::from)
        .collect();

    Ok(Json(assignments))
}

pub async fn add_assignment_handler(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
    Json(payload): Json<AddAssignmentRequest>,
) -> ApiResult<(StatusCode, Json<AssignmentResponse>)> {
    let assignment = state
        .campaign_service
        .add_assignment(
            campaign_id,
            NewCampaignAssignment {
                user_id: UserId::from_uuid(parse_uuid(&payload.user_id, "user_id")?),
                role: payload.role.parse()?,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AssignmentResponse::from(&assignment)),
    ))
}

pub async fn record_metric_handler(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
    Json(payload): Json<RecordMetricRequest>,
) -> ApiResult<StatusCode> {
    state
        .campaign_service
        .record_metric(
            campaign_id,
            RecordMetricInput {
                date: parse_date(&payload.date, "date")?,
                impressions: payload.impressions,
                clicks: payload.clicks,
                conversions: payload.conversions,
            },
        )
        .await?;

    Ok(StatusCode::CREATED)
}

pub async fn list_metrics_handler(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
) -> ApiResult<Json<Vec<MetricResponse>>> {
    let metrics = state
        .campaign_service
        .list_metrics(campaign_id)
        .await?
        .iter()
        .map(MetricResponse::from)
        .collect();

    Ok(Json(metrics))
}

pub async fn metrics_summary_handler(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
) -> ApiResult<Json<MetricsSummaryResponse>> {
    let summary = state.campaign_service.metrics_summary(campaign_id).await?;
    Ok(Json(MetricsSummaryResponse::from(&summary)))
}
