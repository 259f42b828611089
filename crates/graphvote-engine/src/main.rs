//! Vote simulator binary
//!
//! Drives one dual-tier statement through a run of clicks against a flaky
//! in-memory server and logs every outcome and visibility change.

use std::sync::Arc;

use graphvote_core::{EntityKind, VoteCounts, VoteStatus, VoteTier};
use graphvote_engine::{EngineConfig, EntityVotes, InMemoryMetadata, MemoryVoteServer, NodeVoteSummary, VoteOutcome};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const ENTITY_ID: &str = "statement-1";

/// Simulator settings.
#[derive(Debug, Clone)]
struct SimConfig {
    /// Probability that any single server mutation fails.
    failure_rate: f64,
    /// Number of clicks to simulate.
    clicks: usize,
    /// Seed for injected failures.
    seed: u64,
}

impl SimConfig {
    fn from_env() -> Result<Self, graphvote_engine::Error> {
        fn var<T: std::str::FromStr>(key: &str, default: T) -> Result<T, graphvote_engine::Error> {
            match std::env::var(key) {
                Ok(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| graphvote_engine::Error::Config(format!("invalid {}: {:?}", key, raw))),
                Err(_) => Ok(default),
            }
        }

        Ok(Self {
            failure_rate: var("VOTE_SIM_FAILURE_RATE", 0.3)?,
            clicks: var("VOTE_SIM_CLICKS", 12)?,
            seed: var("VOTE_SIM_SEED", 7)?,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vote_sim=info,graphvote_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let sim = SimConfig::from_env()?;
    let engine = EngineConfig::from_env()?;
    tracing::info!(?sim, ?engine, "Starting vote simulator");

    let server = Arc::new(MemoryVoteServer::with_failure_rate(sim.failure_rate, sim.seed));
    let inclusion = VoteCounts::new(5, 2);
    let content = VoteCounts::new(1, 1);
    server.seed(ENTITY_ID, VoteTier::Inclusion, inclusion);
    server.seed(ENTITY_ID, VoteTier::Content, content);

    // Cached node metadata from an earlier session; the server knows better.
    let metadata = Arc::new(InMemoryMetadata::new());
    metadata.load(
        ENTITY_ID,
        serde_json::json!({ "inclusionVoteStatus": { "status": "agree" } }),
    )?;
    let votes = EntityVotes::new(
        EntityKind::Statement,
        ENTITY_ID,
        server.clone(),
        metadata.clone(),
        engine,
    )?;

    let mut visibility = votes.visibility();
    tokio::spawn(async move {
        while visibility.changed().await.is_ok() {
            let visible = *visibility.borrow_and_update();
            tracing::info!(can_show_detail = visible, "Visibility changed");
        }
    });

    votes
        .initialize(
            NodeVoteSummary {
                inclusion_positive_votes: inclusion.positive,
                inclusion_negative_votes: inclusion.negative,
                content_positive_votes: content.positive,
                content_negative_votes: content.negative,
            },
            false,
        )
        .await;

    let stances = [VoteStatus::Agree, VoteStatus::Disagree, VoteStatus::None];
    for click in 0..sim.clicks {
        let tier = if click % 2 == 0 {
            VoteTier::Inclusion
        } else {
            VoteTier::Content
        };
        let requested = stances[(click / 2) % stances.len()];
        let outcome = votes.handle_vote(tier, requested).await?;
        let state = votes.controller(tier)?.state();

        match &outcome {
            VoteOutcome::Success { attempts, .. } => tracing::info!(
                click, %tier, %requested, attempts, counts = %state.counts, "Vote succeeded"
            ),
            VoteOutcome::Failed { error, attempts } => tracing::warn!(
                click, %tier, %requested, attempts, %error, counts = %state.counts, "Vote failed"
            ),
            other => tracing::info!(click, %tier, %requested, outcome = ?other, "Vote skipped"),
        }
    }

    let summary = serde_json::json!({
        "inclusion": votes.inclusion().state(),
        "content": votes.content().map(|c| c.state()),
        "canShowDetail": votes.can_show_detail(),
        "metadata": metadata.record(ENTITY_ID),
        "serverCalls": server.calls().len(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    votes.teardown();
    Ok(())
}
