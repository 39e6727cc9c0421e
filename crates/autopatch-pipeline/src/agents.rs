//! Stage agents
//!
//! Each agent holds its own bus connection and a queue the orchestrator
//! binds before the first publish, so no early event can slip past a
//! not-yet-subscribed stage. Agents react only to the payload shapes they
//! own. Output is always a published event, failures included; nothing is
//! thrown across stage boundaries. Payloads are complete and
//! self-contained, so agents stay order-tolerant and never accumulate
//! partial state across messages.

use autopatch_bus::{Connection, Subscription};
use autopatch_oracle::{Extractor, Oracle, OracleError, Synthesizer};
use autopatch_patch::{apply, load_source, persist_source, Outcome, PatchSpec};
use autopatch_probe::{AttackOutcome, ProbeAgent, TargetApi};
use autopatch_rules::{evaluate, Rulebook, Verdict};
use autopatch_types::{
    routing, AgentKind, BreachReport, Event, FailureKind, Payload, PatchDisposition,
};
use std::path::Path;

fn oracle_failure_kind(e: &OracleError) -> FailureKind {
    match e {
        OracleError::Transport(_) | OracleError::Api { .. } => FailureKind::Transport,
        OracleError::Parse(_) | OracleError::EmptyReply => FailureKind::Parse,
    }
}

/// Drive one probe cycle and publish its classification.
///
/// Returns the outcome so the orchestrator can decide whether to keep
/// cycling; downstream stages react to the published events only.
pub async fn run_probe_cycle<T: TargetApi>(
    conn: &Connection,
    topic: &str,
    probe: &mut ProbeAgent<T>,
    post_id: u64,
) -> Option<AttackOutcome> {
    conn.publish(
        topic,
        &Event::status(
            AgentKind::Probe,
            routing::PROBE_ACTION,
            format!("probe cycle {post_id}: looking for vulnerabilities"),
        ),
    )
    .await;

    let outcome = match probe.run_cycle(post_id).await {
        Ok(outcome) => outcome,
        Err(e) => {
            conn.publish(
                topic,
                &Event::status(
                    AgentKind::Probe,
                    routing::PROBE_ERROR,
                    format!("probe run aborted: {e}"),
                ),
            )
            .await;
            return None;
        }
    };

    match &outcome {
        AttackOutcome::Confirmed { audit_line, .. } => {
            conn.publish(
                topic,
                &Event::new(
                    AgentKind::Probe,
                    routing::PROBE_SUCCESS,
                    Payload::BreachEvidence {
                        audit_line: audit_line.clone(),
                    },
                ),
            )
            .await;
        }
        AttackOutcome::AlreadyFixed => {
            conn.publish(
                topic,
                &Event::status(
                    AgentKind::Probe,
                    routing::PROBE_FAIL,
                    "attack rejected with 403: target already fixed",
                ),
            )
            .await;
        }
        AttackOutcome::Anomalous { status, body } => {
            conn.publish(
                topic,
                &Event::status(
                    AgentKind::Probe,
                    routing::PROBE_ERROR,
                    format!("attack produced unexpected response (status {status}): {body}"),
                ),
            )
            .await;
        }
    }
    Some(outcome)
}

/// Watcher: extraction plus rule evaluation.
///
/// Reacts to `BreachEvidence`. The two detection paths must agree before
/// synthesis is triggered: the evidence only exists because the probe
/// confirmed the breach over HTTP, and a report is only published when the
/// rule engine independently confirms it from the audit line.
pub async fn watcher_agent<O: Oracle>(
    conn: Connection,
    mut sub: Subscription,
    topic: String,
    extractor: Extractor<O>,
    rulebook: Rulebook,
) {
    while let Some(event) = sub.recv().await {
        let Payload::BreachEvidence { audit_line } = event.payload else {
            continue;
        };

        conn.publish(
            &topic,
            &Event::status(
                AgentKind::Extractor,
                routing::WATCHER_ANALYZE,
                format!("analyzing audit line: '{audit_line}'"),
            ),
        )
        .await;

        let record = match extractor.extract(&audit_line).await {
            Ok(record) => record,
            Err(e) => {
                // No breach assumed on failure; silence is not evidence.
                conn.publish(
                    &topic,
                    &Event::failure(
                        AgentKind::Extractor,
                        routing::WATCHER_ERROR,
                        oracle_failure_kind(&e),
                        e.to_string(),
                    ),
                )
                .await;
                continue;
            }
        };

        conn.publish(
            &topic,
            &Event::new(
                AgentKind::Extractor,
                routing::WATCHER_RESULT,
                Payload::RecordExtracted(record.clone()),
            ),
        )
        .await;

        match evaluate(&record, &rulebook) {
            Verdict::Breach { rule_name, record } => {
                let report = BreachReport::new(rule_name, &record);
                conn.publish(
                    &topic,
                    &Event::new(
                        AgentKind::RuleEngine,
                        routing::WATCHER_BREACH,
                        Payload::Breach(report),
                    ),
                )
                .await;
            }
            Verdict::Clear => {
                conn.publish(
                    &topic,
                    &Event::status(
                        AgentKind::RuleEngine,
                        routing::WATCHER_CLEAR,
                        "no rules broken; standing down",
                    ),
                )
                .await;
            }
        }
    }
}

/// Corrector: patch synthesis.
///
/// Reacts to `Breach`. Reads the current source text and asks the oracle
/// for a replacement block; the raw reply goes on the bus untouched.
pub async fn corrector_agent<O: Oracle>(
    conn: Connection,
    mut sub: Subscription,
    topic: String,
    synthesizer: Synthesizer<O>,
    source_path: impl AsRef<Path>,
) {
    let source_path = source_path.as_ref();
    while let Some(event) = sub.recv().await {
        let Payload::Breach(report) = event.payload else {
            continue;
        };

        conn.publish(
            &topic,
            &Event::status(
                AgentKind::Synthesizer,
                routing::CORRECTOR_ANALYZE,
                format!("logic breach detected ({}); generating patch", report.rule_name),
            ),
        )
        .await;

        let source_text = match load_source(source_path) {
            Ok(text) => text,
            Err(e) => {
                // Not a write failure and not an oracle failure; reported
                // like a probe abort, as a terminating status.
                conn.publish(
                    &topic,
                    &Event::status(
                        AgentKind::Synthesizer,
                        routing::CORRECTOR_ERROR,
                        format!("synthesis aborted: {e}"),
                    ),
                )
                .await;
                continue;
            }
        };

        match synthesizer.synthesize(&report, &source_text).await {
            Ok(candidate) => {
                conn.publish(
                    &topic,
                    &Event::new(
                        AgentKind::Synthesizer,
                        routing::CORRECTOR_SUCCESS,
                        Payload::Candidate(candidate),
                    ),
                )
                .await;
            }
            Err(e) => {
                conn.publish(
                    &topic,
                    &Event::failure(
                        AgentKind::Synthesizer,
                        routing::CORRECTOR_ERROR,
                        oracle_failure_kind(&e),
                        e.to_string(),
                    ),
                )
                .await;
            }
        }
    }
}

/// Applier: cleaning, anchored replacement, persistence.
///
/// Reacts to `Candidate`. Exactly one applier instance acts on a given
/// source document; the orchestrator spawns a single one.
pub async fn applier_agent(
    conn: Connection,
    mut sub: Subscription,
    topic: String,
    patch_spec: PatchSpec,
    source_path: impl AsRef<Path>,
) {
    let source_path = source_path.as_ref();
    while let Some(event) = sub.recv().await {
        let Payload::Candidate(candidate) = event.payload else {
            continue;
        };

        conn.publish(
            &topic,
            &Event::status(
                AgentKind::Applier,
                routing::PATCHER_CLEAN,
                "candidate received; cleaning",
            ),
        )
        .await;

        let source_text = match load_source(source_path) {
            Ok(text) => text,
            Err(e) => {
                publish_outcome(
                    &conn,
                    &topic,
                    routing::PATCHER_ERROR,
                    PatchDisposition::Failed,
                    e.to_string(),
                )
                .await;
                continue;
            }
        };

        match apply(&candidate, &source_text, &patch_spec) {
            Outcome::Applied(new_text) => match persist_source(source_path, &new_text) {
                Ok(()) => {
                    publish_outcome(
                        &conn,
                        &topic,
                        routing::PATCHER_SUCCESS,
                        PatchDisposition::Patched,
                        format!("{} autonomously patched", source_path.display()),
                    )
                    .await;
                }
                Err(e) => {
                    conn.publish(
                        &topic,
                        &Event::failure(
                            AgentKind::Applier,
                            routing::PATCHER_ERROR,
                            FailureKind::Write,
                            e.to_string(),
                        ),
                    )
                    .await;
                    publish_outcome(
                        &conn,
                        &topic,
                        routing::PATCHER_ERROR,
                        PatchDisposition::Failed,
                        "persisting new source text failed".to_string(),
                    )
                    .await;
                }
            },
            Outcome::AlreadyPatched => {
                publish_outcome(
                    &conn,
                    &topic,
                    routing::PATCHER_SKIP,
                    PatchDisposition::AlreadySafe,
                    "region already carries the fix".to_string(),
                )
                .await;
            }
            Outcome::AnchorsNotFound => {
                // Expected steady state once a fix has landed.
                publish_outcome(
                    &conn,
                    &topic,
                    routing::PATCHER_SKIP,
                    PatchDisposition::TargetMissing,
                    "patch anchors absent; nothing to do".to_string(),
                )
                .await;
            }
            Outcome::EmptyAfterCleaning => {
                publish_outcome(
                    &conn,
                    &topic,
                    routing::PATCHER_ERROR,
                    PatchDisposition::Failed,
                    "candidate was empty after cleaning; discarded".to_string(),
                )
                .await;
            }
            Outcome::Failed(reason) => {
                publish_outcome(
                    &conn,
                    &topic,
                    routing::PATCHER_ERROR,
                    PatchDisposition::Failed,
                    reason,
                )
                .await;
            }
        }
    }
}

async fn publish_outcome(
    conn: &Connection,
    topic: &str,
    routing_key: &str,
    disposition: PatchDisposition,
    detail: String,
) {
    conn.publish(
        topic,
        &Event::new(
            AgentKind::Applier,
            routing_key,
            Payload::PatchOutcome { disposition, detail },
        ),
    )
    .await;
}
