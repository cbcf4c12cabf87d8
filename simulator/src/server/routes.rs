use crate::store::{read_state, write_state, ScanReport, SharedState};
use chrono::Utc;
use log::{debug, error, info};
use serde_json::json;
use std::convert::Infallible;
use trackcore::model::{ReceiverList, SavePositionsRequest, ValidDevicesResponse};
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::reply::{Json, WithStatus};
use warp::{Filter, Rejection, Reply};

const NOT_JSON: &str = "Request body must be JSON";

fn with_state(state: SharedState) -> impl Filter<Extract = (SharedState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn success() -> WithStatus<Json> {
    warp::reply::with_status(warp::reply::json(&json!({"status": "success"})), StatusCode::OK)
}

fn failure(status: StatusCode, message: &str) -> WithStatus<Json> {
    warp::reply::with_status(
        warp::reply::json(&json!({"status": "error", "message": message})),
        status,
    )
}

/// Every endpoint the dashboard and the receivers talk to.
pub fn routes(state: SharedState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    ingest(state.clone())
        .or(device_positions(state.clone()))
        .or(receiver_positions(state.clone()))
        .or(save_receiver_positions(state.clone()))
        .or(valid_devices(state.clone()))
        .or(rssi(state.clone()))
        .or(scanned_devices(state))
}

fn ingest(state: SharedState) -> impl Filter<Extract = (WithStatus<Json>,), Error = Rejection> + Clone {
    warp::path::end()
        .and(warp::post())
        .and(warp::body::bytes())
        .and(with_state(state))
        .map(|body: Bytes, state: SharedState| {
            let report: ScanReport = match serde_json::from_slice(&body) {
                Ok(report) => report,
                Err(err) => {
                    debug!("rejected scan body: {}", err);
                    return failure(StatusCode::BAD_REQUEST, NOT_JSON);
                }
            };
            match write_state(&state).scans.ingest(report, Utc::now()) {
                Ok(()) => success(),
                Err(err) => failure(StatusCode::BAD_REQUEST, &err.to_string()),
            }
        })
}

fn device_positions(state: SharedState) -> impl Filter<Extract = (Json,), Error = Rejection> + Clone {
    warp::path!("get_device_positions_and_receiver_positions")
        .and(warp::get())
        .and(with_state(state))
        .map(|state: SharedState| warp::reply::json(&read_state(&state).device_positions(Utc::now())))
}

fn receiver_positions(state: SharedState) -> impl Filter<Extract = (Json,), Error = Rejection> + Clone {
    warp::path!("get_receiver_positions")
        .and(warp::get())
        .and(with_state(state))
        .map(|state: SharedState| {
            let receivers = read_state(&state).receivers.receivers();
            warp::reply::json(&ReceiverList { receivers })
        })
}

fn save_receiver_positions(
    state: SharedState,
) -> impl Filter<Extract = (WithStatus<Json>,), Error = Rejection> + Clone {
    warp::path!("save_receiver_positions")
        .and(warp::post())
        .and(warp::body::bytes())
        .and(with_state(state))
        .map(|body: Bytes, state: SharedState| {
            let request: SavePositionsRequest = match serde_json::from_slice(&body) {
                Ok(request) => request,
                Err(err) => {
                    debug!("rejected save body: {}", err);
                    return failure(StatusCode::BAD_REQUEST, NOT_JSON);
                }
            };
            let count = request.devices.len();
            match write_state(&state).receivers.replace(request.devices) {
                Ok(()) => {
                    info!("receiver placement saved ({} devices)", count);
                    success()
                }
                Err(err) => {
                    error!("saving receiver placement failed: {:#}", err);
                    failure(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
                }
            }
        })
}

fn valid_devices(state: SharedState) -> impl Filter<Extract = (Json,), Error = Rejection> + Clone {
    warp::path!("api" / "valid_devices")
        .and(warp::get())
        .and(with_state(state))
        .map(|state: SharedState| {
            let count = read_state(&state).scans.valid_device_count(Utc::now());
            warp::reply::json(&ValidDevicesResponse {
                valid_device_count: count as u32,
            })
        })
}

fn rssi(state: SharedState) -> impl Filter<Extract = (Json,), Error = Rejection> + Clone {
    warp::path!("api" / "rssi")
        .and(warp::get())
        .and(with_state(state))
        .map(|state: SharedState| warp::reply::json(&read_state(&state).scans.rssi_by_receiver(Utc::now())))
}

fn scanned_devices(state: SharedState) -> impl Filter<Extract = (Json,), Error = Rejection> + Clone {
    warp::path!("api" / "scanned_devices")
        .and(warp::get())
        .and(with_state(state))
        .map(|state: SharedState| warp::reply::json(&read_state(&state).scans.scanned_devices()))
}
