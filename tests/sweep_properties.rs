//! Property tests for sweep ordering and stop policies
//!
//! Each case serves a random status grid (versions × candidates) from a
//! wiremock gateway and checks that:
//! - Exhaustive mode returns every combination, versions outer, candidates inner
//! - First-success mode returns the sweep-order prefix ending at the first 200
//!   and issues no request past it

use judgeprobe::config::Credential;
use judgeprobe::probe::{EndpointProbe, EndpointSpec, ModelCandidate, ProbeMode, ProbeResult};
use proptest::prelude::*;
use serde_json::json;
use std::time::Duration;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, method, path},
};

const VERSIONS: [&str; 3] = ["v1", "v2", "v3"];
const MODELS: [&str; 3] = ["m0", "m1", "m2"];

type Trail = Vec<(String, String, Option<u16>)>;

fn status_grid() -> impl Strategy<Value = Vec<Vec<u16>>> {
    (1usize..=3, 1usize..=3).prop_flat_map(|(versions, models)| {
        prop::collection::vec(
            prop::collection::vec(prop::sample::select(vec![200u16, 404, 401, 500]), models),
            versions,
        )
    })
}

fn trail(results: &[ProbeResult]) -> Trail {
    results
        .iter()
        .map(|r| {
            (
                r.version_used().unwrap_or_default().to_string(),
                r.candidate().public_id().to_string(),
                r.status_code(),
            )
        })
        .collect()
}

/// Every combination in sweep order
fn full_trail(grid: &[Vec<u16>]) -> Trail {
    grid.iter()
        .enumerate()
        .flat_map(|(v, row)| {
            row.iter()
                .enumerate()
                .map(move |(m, status)| (VERSIONS[v].to_string(), MODELS[m].to_string(), Some(*status)))
        })
        .collect()
}

/// Runs both modes against one gateway: (first-success trail, requests it sent, exhaustive trail)
async fn sweep(grid: &[Vec<u16>]) -> (Trail, usize, Trail) {
    let server = MockServer::start().await;
    for (v, row) in grid.iter().enumerate() {
        for (m, status) in row.iter().enumerate() {
            Mock::given(method("POST"))
                .and(path(format!("/{}/chat/completions", VERSIONS[v])))
                .and(body_partial_json(json!({ "model": MODELS[m] })))
                .respond_with(ResponseTemplate::new(*status))
                .mount(&server)
                .await;
        }
    }

    let endpoint = EndpointSpec::new(&server.uri(), &[])
        .unwrap()
        .with_api_versions(VERSIONS.iter().take(grid.len()).copied());
    let candidates: Vec<_> = MODELS
        .iter()
        .take(grid[0].len())
        .map(|id| ModelCandidate::new(*id))
        .collect();
    let credential = Credential::new("sk-test");
    let client = EndpointProbe::new(Duration::from_secs(2)).unwrap();

    let first = client
        .probe(&endpoint, &credential, &candidates, ProbeMode::FirstSuccess)
        .await
        .unwrap();
    let sent = server.received_requests().await.unwrap_or_default().len();
    let exhaustive = client
        .probe(&endpoint, &credential, &candidates, ProbeMode::Exhaustive)
        .await
        .unwrap();

    (trail(&first), sent, trail(&exhaustive))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_sweep_follows_status_grid(grid in status_grid()) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let (first, sent, exhaustive) = runtime.block_on(sweep(&grid));

        let expected = full_trail(&grid);
        prop_assert_eq!(&exhaustive, &expected);

        let stop = expected
            .iter()
            .position(|(_, _, status)| *status == Some(200))
            .map_or(expected.len(), |i| i + 1);
        prop_assert_eq!(&first, &expected[..stop].to_vec());
        prop_assert_eq!(sent, stop);
    }
}
