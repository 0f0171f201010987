use anyhow::{Context, Result};
use tracing::{debug, info, info_span, trace};

use migrate_cli::files::{load_config, load_records, load_seed, write_snapshot};
use migrate_cli::logging::redact_value;
use migrate_map::{ConfidenceThresholds, MigrationSession};
use migrate_model::{CardinalityPolicy, Link, RecordKey, RecordSet, SessionConfig, Side};

use crate::cli::{MatchArgs, SessionArgs, SuggestArgs};
use crate::types::{LinkRow, MatchResult, SuggestResult, SuggestionRow};

pub fn run_match(args: &MatchArgs) -> Result<MatchResult> {
    let span = info_span!(
        "match",
        old = %args.session.old.display(),
        new = %args.session.new.display()
    );
    let _guard = span.enter();

    let mut session = build_session(&args.session)?;
    let matched = if args.dry_run {
        session.plan_auto_match()
    } else {
        session.auto_match()
    };
    drain_events(&mut session);

    let output = match &args.output {
        Some(path) if !args.dry_run => {
            let snapshot = session.request_export();
            write_snapshot(path, &snapshot)
                .with_context(|| format!("write mapping to {}", path.display()))?;
            info!(path = %path.display(), links = snapshot.links.len(), "mapping exported");
            drain_events(&mut session);
            Some(path.clone())
        }
        _ => None,
    };

    let shown: Vec<Link> = if args.dry_run {
        matched.clone()
    } else {
        session.export_mappings()
    };
    let progress = session.progress();
    Ok(MatchResult {
        policy: session.config().policy,
        threshold: session.config().threshold,
        matched: matched.len(),
        rows: link_rows(&session, &shown),
        progress,
        confidence: ConfidenceThresholds::for_profile(args.confidence.into()).review(&matched),
        unlinked_old: session.unlinked_old().into_iter().cloned().collect(),
        output,
        dry_run: args.dry_run,
        incomplete: args.require_complete && !progress.is_complete(),
    })
}

pub fn run_suggest(args: &SuggestArgs) -> Result<SuggestResult> {
    let span = info_span!("suggest", record = %args.record);
    let _guard = span.enter();

    let session = build_session(&args.session)?;
    let old_key = RecordKey::new(args.record.as_str());
    let candidates = session
        .suggestions_for(old_key.clone(), args.limit)
        .with_context(|| format!("rank candidates for {old_key}"))?;
    let display_field = session.config().display_field.as_str();
    let old_display = display_text(session.old_records(), &old_key, display_field);
    trace!(display = redact_value(&old_display), "ranking candidates");
    debug!(candidates = candidates.len(), "candidates ranked");

    let linked_to_query = session.store().links_for_old(&old_key);
    let mut rows = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let explanation = session
            .explain(old_key.clone(), candidate.key.clone())
            .with_context(|| format!("explain {old_key} -> {}", candidate.key))?
            .explain();
        rows.push(SuggestionRow {
            new_display: display_text(session.new_records(), &candidate.key, display_field),
            linked: linked_to_query
                .iter()
                .any(|link| link.new_key == candidate.key),
            new_key: candidate.key,
            score: candidate.score,
            explanation,
        });
    }
    Ok(SuggestResult {
        old_key,
        old_display,
        rows,
    })
}

/// Loads configuration, both record sets and optional seed links.
fn build_session(args: &SessionArgs) -> Result<MigrationSession> {
    let config = session_config(args)?;
    let old = load_records(&args.old, Side::Old, &config.key_field).context("load old records")?;
    let new = load_records(&args.new, Side::New, &config.key_field).context("load new records")?;
    let mut session =
        MigrationSession::from_sets(config, old, new).context("start migration session")?;
    if let Some(path) = &args.seed {
        let seed = load_seed(path).context("load seed links")?;
        session = session.with_links(seed).context("apply seed links")?;
    }
    Ok(session)
}

/// Config file values first, then command-line overrides.
fn session_config(args: &SessionArgs) -> Result<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path).context("load session config")?,
        None => SessionConfig::default(),
    };
    if let Some(field) = &args.key_field {
        config.key_field = field.clone();
    }
    if let Some(field) = &args.display_field {
        config.display_field = field.clone();
    }
    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    if let Some(metric) = args.metric {
        config.metric = metric.into();
    }
    if args.allow_multiple {
        config.policy = CardinalityPolicy::ManyToOne;
    }
    config.validate().context("invalid session config")?;
    Ok(config)
}

fn drain_events(session: &mut MigrationSession) {
    for event in session.take_events() {
        debug!(event = event.name(), links = event.links().len(), "session event");
    }
}

fn link_rows(session: &MigrationSession, links: &[Link]) -> Vec<LinkRow> {
    let display_field = session.config().display_field.as_str();
    links
        .iter()
        .map(|link| LinkRow {
            old_display: display_text(session.old_records(), &link.old_key, display_field),
            new_display: display_text(session.new_records(), &link.new_key, display_field),
            old_key: link.old_key.clone(),
            new_key: link.new_key.clone(),
            score: link.score,
            origin: link.origin,
        })
        .collect()
}

fn display_text(set: &RecordSet, key: &RecordKey, field: &str) -> String {
    set.get(key)
        .and_then(|record| record.text(field))
        .map(|text| text.into_owned())
        .unwrap_or_default()
}
