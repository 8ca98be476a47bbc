//! Implementations of the `ward` subcommands.
//!
//! Each command writes its human-readable output to `out` so it can be
//! exercised against an in-memory ledger.

use std::io::Write;

use anyhow::{Context, Result, bail};
use ward_ledger::Ledger;
use ward_log::MutationEntry;
use ward_types::{PatientData, PatientId, PatientPatch};

pub fn cmd_add(ledger: &mut Ledger, record: PatientData, out: &mut impl Write) -> Result<()> {
    let id = record.id;
    let entry = ledger.add(record).context("add failed")?;
    writeln!(out, "added patient {id} ({})", entry.key)?;
    Ok(())
}

pub fn cmd_update(
    ledger: &mut Ledger,
    id: PatientId,
    patch: PatientPatch,
    out: &mut impl Write,
) -> Result<()> {
    if patch.is_empty() {
        bail!("nothing to update: pass --name, --cured, --disease or --clear-diseases");
    }
    let entry = ledger.update(id, &patch).context("update failed")?;
    writeln!(out, "updated patient {id} ({})", entry.key)?;
    Ok(())
}

pub fn cmd_remove(ledger: &mut Ledger, id: PatientId, out: &mut impl Write) -> Result<()> {
    let entry = ledger.remove(id).context("remove failed")?;
    writeln!(out, "removed patient {id} ({})", entry.key)?;
    Ok(())
}

pub fn cmd_show(ledger: &Ledger, id: PatientId, out: &mut impl Write) -> Result<()> {
    match ledger.get(id) {
        Some(record) => writeln!(out, "{record}")?,
        None => bail!("patient {id} not found"),
    }
    Ok(())
}

pub fn cmd_list(ledger: &Ledger, out: &mut impl Write) -> Result<()> {
    let mut count = 0;
    for record in ledger.records() {
        writeln!(out, "{record}")?;
        count += 1;
    }
    if count == 0 {
        writeln!(out, "no patients")?;
    }
    Ok(())
}

pub fn cmd_history(ledger: &Ledger, out: &mut impl Write) -> Result<()> {
    let scan = ledger.history().context("cannot read history")?;
    for entry in &scan.entries {
        write_entry(out, entry)?;
    }
    for skipped in &scan.skipped {
        writeln!(out, "{}  skipped: {}", skipped.name, skipped.reason)?;
    }
    if scan.entries.is_empty() && scan.skipped.is_empty() {
        writeln!(out, "no history")?;
    }
    Ok(())
}

/// Full verification, or a step-through of the first `steps` entries.
pub fn cmd_audit(ledger: &Ledger, steps: Option<usize>, out: &mut impl Write) -> Result<()> {
    let Some(steps) = steps else {
        let report = ledger.audit().context("audit failed")?;
        writeln!(out, "verified {} entries", report.entries)?;
        for skipped in &report.skipped {
            writeln!(out, "skipped {}: {}", skipped.name, skipped.reason)?;
        }
        writeln!(out, "fingerprint: {}", report.fingerprint)?;
        let status = if report.matches_live { "matches" } else { "DIFFERS" };
        writeln!(out, "live tree: {status}")?;
        return Ok(());
    };

    let mut browse = ledger.browse().context("cannot read history")?;
    let total = browse.total();
    for index in 1..=steps {
        let Some(item) = browse.next() else { break };
        let entry = item.context("audit failed")?;
        writeln!(
            out,
            "[{index}/{total}] {} {} {} -> {}",
            entry.key,
            entry.mutation.operation(),
            entry.mutation.id(),
            browse_fingerprint(&browse),
        )?;
    }
    let applied = browse.replayer().applied();
    if applied < total {
        writeln!(out, "stopped after {applied} of {total} entries")?;
    } else {
        writeln!(out, "verified {total} entries")?;
    }
    Ok(())
}

pub fn cmd_rollback(ledger: &mut Ledger, steps: usize, out: &mut impl Write) -> Result<()> {
    let report = ledger.rollback(steps).context("rollback failed")?;
    writeln!(out, "rolled back {steps} step(s) to {}", report.target)?;
    writeln!(
        out,
        "abandoned: {}, archived: {}",
        report.abandoned.len(),
        report.archived
    )?;
    writeln!(out, "fingerprint: {}", report.fingerprint)?;
    Ok(())
}

pub fn cmd_purge(ledger: &mut Ledger, confirmed: bool, out: &mut impl Write) -> Result<()> {
    let removed = ledger
        .purge(confirmed)
        .context("purge refused, pass --yes to delete all history")?;
    writeln!(out, "purged {removed} entries")?;
    Ok(())
}

pub fn cmd_check(ledger: &Ledger, out: &mut impl Write) -> Result<()> {
    let tree = ledger.tree();
    tree.validate().context("tree invariants violated")?;
    writeln!(
        out,
        "tree ok: {} records, height {}",
        tree.len(),
        tree.height()
    )?;
    writeln!(out, "fingerprint: {}", tree.fingerprint())?;
    Ok(())
}

// ----- Internal -----

fn write_entry(out: &mut impl Write, entry: &MutationEntry) -> std::io::Result<()> {
    writeln!(
        out,
        "{}  {:<6}  {}  {}",
        entry.key,
        entry.mutation.operation(),
        entry.mutation.id(),
        entry.hash
    )
}

fn browse_fingerprint(browse: &ward_log::Browse) -> String {
    browse
        .tree()
        .map(|t| t.fingerprint().to_string())
        .unwrap_or_else(|| "-".to_string())
}
