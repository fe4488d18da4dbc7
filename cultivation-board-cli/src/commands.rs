//! Command handlers. Each one loads what it needs through a `BoardSession`
//! and prints a table to stdout.

use crate::cli::{Cli, MoveArgs};
use anyhow::{bail, Context};
use comfy_table::{presets::UTF8_FULL, Table};
use cultivation_board::{
    AreaId, Batch, Board, BoardSession, Facility, MoveIntent, MoveOutcome, Notification,
    NotificationSink, PermissionGate, RequestContext, Severity, Stage,
};

/// Prints notifications to stderr as they arrive
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrNotifier;

impl NotificationSink for StderrNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Success | Severity::Info => eprintln!("{}", notification.message),
            severity => eprintln!("{severity}: {}", notification.message),
        }
    }
}

/// Build the per-call context from the global flags
pub fn request_context(cli: &Cli) -> RequestContext {
    let mut ctx = RequestContext::new().with_gate(PermissionGate::from_operator_flag(cli.operator));
    if let Some(tenant) = &cli.tenant {
        ctx = ctx.with_scope(tenant.as_str());
    }
    if let Some(facility) = cli.facility {
        ctx = ctx.with_facility(facility);
    }
    ctx
}

pub async fn run_board(session: &BoardSession, ctx: &RequestContext) -> anyhow::Result<()> {
    session.load(ctx).await.context("failed to load the board")?;
    println!("{}", board_table(&session.board()));
    Ok(())
}

pub async fn run_move(
    session: &BoardSession,
    ctx: &RequestContext,
    args: &MoveArgs,
) -> anyhow::Result<()> {
    let intent = match (args.to_stage, args.onto_area) {
        (Some(stage), None) => MoveIntent::onto_stage(args.area, stage),
        (None, Some(target)) => MoveIntent::onto_area(args.area, target),
        _ => bail!("pass exactly one of --to-stage or --onto-area"),
    };

    session.load(ctx).await.context("failed to load the board")?;
    if session.board().area(AreaId::new(args.area)).is_none() {
        bail!("cultivation area {} is not on the board", args.area);
    }

    let outcome = session.apply_move(intent, ctx).await?;
    match outcome {
        MoveOutcome::NoOp => println!("Nothing to do: the area is already there."),
        MoveOutcome::Denied => bail!("move refused for facility operators"),
        MoveOutcome::Moved { committed, .. } => {
            println!("{}", board_table(&session.board()));
            if !committed {
                bail!("the move was not fully saved; the board above is the server's state");
            }
        }
    }
    Ok(())
}

pub async fn run_stages(session: &BoardSession, ctx: &RequestContext) -> anyhow::Result<()> {
    session
        .refresh_stages(ctx)
        .await
        .context("failed to load stages")?;
    println!("{}", stage_table(&session.stages()));
    Ok(())
}

pub async fn run_facilities(session: &BoardSession, ctx: &RequestContext) -> anyhow::Result<()> {
    let facilities = session
        .list_facilities(ctx)
        .await
        .context("failed to load facilities")?;
    println!("{}", facility_table(&facilities));
    Ok(())
}

pub async fn run_batches(
    session: &BoardSession,
    ctx: &RequestContext,
    area: u64,
) -> anyhow::Result<()> {
    let batches = session
        .list_batches(AreaId::new(area), ctx)
        .await
        .with_context(|| format!("failed to load batches of area {area}"))?;
    println!("{}", batch_table(&batches));
    Ok(())
}

/// One row per area, grouped by stage in board order
pub fn board_table(board: &Board) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Stage", "#", "Area ID", "Name", "Capacity"]);

    for lane in board.lanes() {
        if lane.areas.is_empty() {
            table.add_row(vec![lane.stage.name.clone(), "-".into(), "".into(), "".into(), "".into()]);
            continue;
        }
        for area in &lane.areas {
            let capacity = match (area.capacity_units, &area.capacity_unit_type) {
                (Some(units), Some(unit)) => format!("{units} {unit}"),
                (Some(units), None) => units.to_string(),
                _ => String::new(),
            };
            table.add_row(vec![
                lane.stage.name.clone(),
                area.order.to_string(),
                area.id.to_string(),
                area.name.clone(),
                capacity,
            ]);
        }
    }
    table
}

pub fn stage_table(stages: &[Stage]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Order", "Stage ID", "Name"]);
    for stage in stages {
        table.add_row(vec![
            stage.order.to_string(),
            stage.id.to_string(),
            stage.name.clone(),
        ]);
    }
    table
}

pub fn facility_table(facilities: &[Facility]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Facility ID", "Name", "Tenant"]);
    for facility in facilities {
        table.add_row(vec![
            facility.id.to_string(),
            facility.name.clone(),
            facility
                .tenant_id
                .map(|t| t.to_string())
                .unwrap_or_default(),
        ]);
    }
    table
}

pub fn batch_table(batches: &[Batch]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Batch ID", "Name", "Variety", "Units", "Harvest"]);
    for batch in batches {
        table.add_row(vec![
            batch.id.to_string(),
            batch.name.clone(),
            batch.variety.clone().unwrap_or_default(),
            batch.current_units.to_string(),
            batch
                .harvest_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
        ]);
    }
    table
}
