use comfy_table::Cell;

use crate::hash::SlotInfo;

pub fn pretty_format_directory(slots: &[SlotInfo]) -> comfy_table::Table {
    let mut table = comfy_table::Table::new();
    table.load_preset("||--+-++|    ++++++");

    if slots.is_empty() {
        return table;
    }

    table.set_header(vec![
        Cell::new("slot"),
        Cell::new("bits"),
        Cell::new("bucket"),
        Cell::new("local depth"),
        Cell::new("entries"),
    ]);

    let global_depth = slots.len().trailing_zeros() as usize;
    for info in slots {
        table.add_row(vec![
            Cell::new(info.slot),
            Cell::new(format!("{:0width$b}", info.slot, width = global_depth.max(1))),
            Cell::new(info.bucket_id),
            Cell::new(info.local_depth),
            Cell::new(info.len),
        ]);
    }

    table
}
