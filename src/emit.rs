//! Per-type hub records.
//!
//! A hub record is what the image writer stores for one type: its type check
//! range and ids, its dispatch table, and the derived stamps. Records are
//! produced in height order; the per-type work runs on the rayon pool since
//! the finished layout is read-only.

use crate::Layout;
use hubforge_common::TypeId;
use hubforge_dispatch::DispatchEntry;
use hubforge_hierarchy::{TypeKind, TypeUniverse};
use hubforge_typecheck::{RangeCheck, TypeCheckData};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info_span};

/// Start of one interface's itable segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ItableOffset {
    pub interface: TypeId,
    pub offset: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HubRecord {
    pub type_id: TypeId,
    pub name: String,
    pub kind: &'static str,
    /// Position in the height order.
    pub ordinal: u32,
    pub type_check: RangeCheck,
    /// One id per type check slot, class slots first.
    pub type_check_slots: Vec<u16>,
    pub dispatch_table: Vec<DispatchEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub itable_offsets: Vec<ItableOffset>,
    pub strengthened_stamp: Option<TypeId>,
    pub unique_concrete: Option<TypeId>,
}

fn kind_name(kind: TypeKind) -> &'static str {
    match kind {
        TypeKind::Primitive => "primitive",
        TypeKind::Class => "class",
        TypeKind::Interface => "interface",
        TypeKind::Array => "array",
    }
}

/// One record per type that is part of the layout, in height order.
pub fn hub_records(universe: &TypeUniverse, layout: &Layout) -> Vec<HubRecord> {
    let _span = info_span!("hub_records").entered();
    let mut included: Vec<(TypeId, &TypeCheckData)> = layout.type_checks.iter().collect();
    included.sort_by_key(|(_, data)| data.ordinal);

    let records: Vec<HubRecord> = included
        .par_iter()
        .map(|&(ty, data)| hub_record(universe, layout, ty, data))
        .collect();
    debug!(records = records.len(), "hub records emitted");
    records
}

fn hub_record(
    universe: &TypeUniverse,
    layout: &Layout,
    ty: TypeId,
    data: &TypeCheckData,
) -> HubRecord {
    let info = universe.ty(ty);
    let stamp = layout.stamps.get(ty);
    HubRecord {
        type_id: ty,
        name: info.name.clone(),
        kind: kind_name(info.kind),
        ordinal: data.ordinal,
        type_check: data.check,
        type_check_slots: data.slots.to_vec(),
        dispatch_table: layout.dispatch.table(ty).entries.clone(),
        itable_offsets: layout
            .dispatch
            .itable_offsets(ty)
            .iter()
            .map(|&(interface, offset)| ItableOffset { interface, offset })
            .collect(),
        strengthened_stamp: stamp.strengthened,
        unique_concrete: stamp.unique_concrete,
    }
}

/// Newline-delimited JSON, one record per line.
pub fn to_json_lines(records: &[HubRecord]) -> serde_json::Result<String> {
    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string(record)?);
        out.push('\n');
    }
    Ok(out)
}
