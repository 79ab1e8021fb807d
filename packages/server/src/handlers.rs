//! HTTP handler functions for the corona stats API.

use actix_web::{HttpResponse, web};
use corona_stats_cases_models::WindowPreset;
use corona_stats_estimation::{EstimationError, EstimationSettings, weekday};
use corona_stats_server_models::{
    ApiAreaList, ApiCurve, ApiError, ApiHealth, ApiRSeries, ApiRefresh, ApiReport, ApiWeeklyFactor,
    AreaQueryParams, AreaTypeQueryParams,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        records: state.snapshot().len(),
    })
}

/// `GET /api/area-types`
pub async fn area_types(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.snapshot().list_area_types())
}

/// `GET /api/areas?areaType=`
///
/// An unknown area type yields an empty list.
pub async fn areas(
    state: web::Data<AppState>,
    params: web::Query<AreaTypeQueryParams>,
) -> HttpResponse {
    let areas = state.snapshot().list_areas(&params.area_type);
    HttpResponse::Ok().json(ApiAreaList {
        area_type: params.into_inner().area_type,
        areas,
    })
}

/// `GET /api/curve?areaType=&areaName=`
///
/// Returns the curve after the requested weekday correction and smoothing.
pub async fn curve(
    state: web::Data<AppState>,
    params: web::Query<AreaQueryParams>,
) -> HttpResponse {
    let Some(area_name) = params.area_name.as_deref() else {
        return missing_area_name();
    };
    let settings = settings_from(&params, &state.config.estimation);

    match corona_stats_estimation::estimate_area(
        &state.snapshot(),
        &params.area_type,
        area_name,
        &settings,
    ) {
        Ok(estimate) => HttpResponse::Ok().json(ApiCurve::new(
            &estimate.area_type,
            &estimate.area_name,
            &estimate.curve,
        )),
        Err(e) => estimation_error(&e),
    }
}

/// `GET /api/r?areaType=&areaName=`
pub async fn r(state: web::Data<AppState>, params: web::Query<AreaQueryParams>) -> HttpResponse {
    let Some(area_name) = params.area_name.as_deref() else {
        return missing_area_name();
    };
    let settings = settings_from(&params, &state.config.estimation);

    match corona_stats_estimation::estimate_area(
        &state.snapshot(),
        &params.area_type,
        area_name,
        &settings,
    ) {
        Ok(estimate) => HttpResponse::Ok().json(ApiRSeries::from_estimate(
            &estimate,
            settings.t_infectious,
        )),
        Err(e) => estimation_error(&e),
    }
}

/// `GET /api/weekly-factor?areaType=&areaName=`
///
/// The factor is always estimated from the raw curve.
pub async fn weekly_factor(
    state: web::Data<AppState>,
    params: web::Query<AreaQueryParams>,
) -> HttpResponse {
    let Some(area_name) = params.area_name.as_deref() else {
        return missing_area_name();
    };

    let factor = state
        .snapshot()
        .extract(&params.area_type, area_name)
        .and_then(|curve| weekday::weekly_factor(&curve));

    match factor {
        Ok(factor) => HttpResponse::Ok().json(ApiWeeklyFactor::new(
            &params.area_type,
            area_name,
            &factor,
        )),
        Err(e) => estimation_error(&e),
    }
}

/// `GET /api/report?areaType=`
///
/// R for every area of the type. Fails as a whole if any area fails.
pub async fn report(
    state: web::Data<AppState>,
    params: web::Query<AreaQueryParams>,
) -> HttpResponse {
    let settings = settings_from(&params, &state.config.estimation);

    match corona_stats_estimation::estimate_area_type(
        &state.snapshot(),
        &params.area_type,
        &settings,
    ) {
        Ok(report) => HttpResponse::Ok().json(ApiReport::from(&report)),
        Err(e) => estimation_error(&e),
    }
}

/// `POST /api/refresh`
///
/// Reloads the case table from the configured source and swaps it in.
/// On failure the previous snapshot stays in place.
pub async fn refresh(state: web::Data<AppState>) -> HttpResponse {
    match corona_stats_source::load(&state.config.source).await {
        Ok(table) => {
            let body = ApiRefresh {
                records: table.len(),
                area_types: table.list_area_types(),
            };
            state.replace(table);
            HttpResponse::Ok().json(body)
        }
        Err(e) => {
            log::error!("Failed to refresh case table: {e}");
            HttpResponse::BadGateway().json(ApiError {
                error: format!("Failed to refresh case table: {e}"),
            })
        }
    }
}

/// Merges request overrides onto the configured defaults. A window preset
/// given without `smooth` turns smoothing on.
fn settings_from(params: &AreaQueryParams, defaults: &EstimationSettings) -> EstimationSettings {
    EstimationSettings {
        t_infectious: params.t_infectious.unwrap_or(defaults.t_infectious),
        smooth: params
            .smooth
            .unwrap_or(defaults.smooth || params.window.is_some()),
        smoothing_window: params
            .window
            .map_or(defaults.smoothing_window, WindowPreset::window),
        weekday_correction: params
            .weekday_correction
            .unwrap_or(defaults.weekday_correction),
    }
}

fn missing_area_name() -> HttpResponse {
    HttpResponse::BadRequest().json(ApiError {
        error: "Missing query parameter 'areaName'".to_string(),
    })
}

fn estimation_error(e: &EstimationError) -> HttpResponse {
    let mut response = match e {
        EstimationError::EmptySelection { .. } => HttpResponse::NotFound(),
        EstimationError::InvalidParameter { .. } | EstimationError::MisalignedCurve(_) => {
            HttpResponse::BadRequest()
        }
        EstimationError::DegenerateHistory { .. } => HttpResponse::UnprocessableEntity(),
    };

    log::debug!("Request failed: {e}");

    response.json(ApiError {
        error: e.to_string(),
    })
}
