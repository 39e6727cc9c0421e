//! Pipeline orchestrator
//!
//! Owns process lifecycle only: loads the rulebook, verifies the oracle is
//! reachable, stands up the broker, and spawns one task per agent. Each
//! agent gets its own bus connection and coordinates with the others purely
//! through published events. Exactly one applier is spawned per source
//! document so apply operations never interleave.

use crate::agents::{applier_agent, corrector_agent, run_probe_cycle, watcher_agent};
use crate::config::PipelineConfig;
use anyhow::Context;
use autopatch_bus::{BusClient, MemoryConnector};
use autopatch_oracle::{Extractor, OracleClient, Synthesizer};
use autopatch_probe::{AttackOutcome, HttpTarget, ProbeAgent};
use autopatch_rules::{evaluate, Rulebook, Verdict};
use autopatch_types::{routing, AgentKind, Event};
use std::time::Duration;

/// The assembled detect/diagnose/remediate pipeline
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Assemble a pipeline from configuration
    #[inline]
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the full swarm until interrupted.
    ///
    /// Startup is fail-fast: a missing rulebook or an unreachable oracle
    /// aborts before any agent is spawned. After startup the loop never
    /// exits on its own; a patched target is a steady state, not a
    /// shutdown condition, because a redeploy can reintroduce the flaw.
    pub async fn run(self) -> anyhow::Result<()> {
        let config = self.config;

        let rulebook = Rulebook::load(&config.rulebook_path)
            .context("loading rulebook")?;
        tracing::info!(rules = rulebook.len(), "rulebook loaded");

        let oracle = OracleClient::new(config.oracle.clone())?;
        oracle
            .ping()
            .await
            .context("oracle unreachable at startup")?;

        let (_broker, connector) = MemoryConnector::standalone();

        // Queues are bound here, before the first publish, so nothing the
        // probe emits can race a stage that has not subscribed yet.
        let watcher_conn = BusClient::connect(&connector).await;
        let watcher_sub = watcher_conn.subscribe_all(&config.topic).await;
        tokio::spawn(watcher_agent(
            watcher_conn,
            watcher_sub,
            config.topic.clone(),
            Extractor::new(oracle.clone()),
            rulebook,
        ));

        let corrector_conn = BusClient::connect(&connector).await;
        let corrector_sub = corrector_conn.subscribe_all(&config.topic).await;
        tokio::spawn(corrector_agent(
            corrector_conn,
            corrector_sub,
            config.topic.clone(),
            Synthesizer::new(oracle.clone(), config.synthesis.clone()),
            config.source_path.clone(),
        ));

        let applier_conn = BusClient::connect(&connector).await;
        let applier_sub = applier_conn.subscribe_all(&config.topic).await;
        tokio::spawn(applier_agent(
            applier_conn,
            applier_sub,
            config.topic.clone(),
            config.patch.clone(),
            config.source_path.clone(),
        ));

        let probe_conn = BusClient::connect(&connector).await;
        probe_conn
            .publish(
                &config.topic,
                &Event::status(
                    AgentKind::System,
                    routing::SYSTEM_START,
                    "swarm online; beginning probe cycles",
                ),
            )
            .await;

        let target =
            HttpTarget::new(config.target_url.clone()).context("building target client")?;
        let mut probe = ProbeAgent::new(target, config.probe.clone());
        let interval = Duration::from_secs(config.attack_interval_secs);

        let mut fix_announced = false;
        let mut post_id: u64 = 1;
        loop {
            let outcome =
                run_probe_cycle(&probe_conn, &config.topic, &mut probe, post_id).await;

            match outcome {
                Some(AttackOutcome::AlreadyFixed) if !fix_announced => {
                    // Announced once; probing continues in case the flaw
                    // comes back with a later deploy.
                    probe_conn
                        .publish(
                            &config.topic,
                            &Event::status(
                                AgentKind::System,
                                routing::SYSTEM_DONE,
                                "target rejects the attack; remediation holding",
                            ),
                        )
                        .await;
                    fix_announced = true;
                }
                Some(AttackOutcome::Confirmed { .. }) => {
                    fix_announced = false;
                }
                _ => {}
            }

            post_id += 1;
            tokio::time::sleep(interval).await;
        }
    }
}

/// Run a single probe cycle and report its classification (CLI `probe`)
pub async fn probe_once(config: &PipelineConfig) -> anyhow::Result<AttackOutcome> {
    let target = HttpTarget::new(config.target_url.clone()).context("building target client")?;
    let mut probe = ProbeAgent::new(target, config.probe.clone());
    let outcome = probe.run_cycle(1).await.context("probe run aborted")?;
    Ok(outcome)
}

/// Extract and evaluate a single audit line (CLI `check`)
pub async fn check_line(config: &PipelineConfig, line: &str) -> anyhow::Result<Verdict> {
    let rulebook = Rulebook::load(&config.rulebook_path).context("loading rulebook")?;
    let oracle = OracleClient::new(config.oracle.clone())?;
    oracle
        .ping()
        .await
        .context("oracle unreachable")?;
    let record = Extractor::new(oracle)
        .extract(line)
        .await
        .context("extraction failed")?;
    Ok(evaluate(&record, &rulebook))
}
