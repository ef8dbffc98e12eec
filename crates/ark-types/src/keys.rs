/// Field names used by the structured (JSON-like) serialization form (spec
/// §6.2): every type emits a mapping keyed by one of these names, picked
/// from either the short `keys_json` table or the long `keys_python` one.
#[derive(Debug, Clone, Copy)]
pub struct Keys {
    pub type_name: &'static str,
    pub type_desc: &'static str,
    pub type_style: &'static str,
    pub reftime_position_time: &'static str,
    pub reftime_period_begin: &'static str,
    pub reftime_period_end: &'static str,
    pub origin_centre: &'static str,
    pub origin_subcentre: &'static str,
    pub origin_process: &'static str,
    pub origin_process_type: &'static str,
    pub origin_background_process_id: &'static str,
    pub origin_process_id: &'static str,
    pub origin_wmo: &'static str,
    pub origin_rad: &'static str,
    pub origin_plc: &'static str,
    pub product_origin: &'static str,
    pub product_table: &'static str,
    pub product_product: &'static str,
    pub product_centre: &'static str,
    pub product_discipline: &'static str,
    pub product_category: &'static str,
    pub product_number: &'static str,
    pub product_table_version: &'static str,
    pub product_local_table_version: &'static str,
    pub product_type: &'static str,
    pub product_subtype: &'static str,
    pub product_local_subtype: &'static str,
    pub product_value: &'static str,
    pub product_object: &'static str,
    pub product_id: &'static str,
    pub source_format: &'static str,
    pub source_size: &'static str,
    pub source_url: &'static str,
    pub source_basedir: &'static str,
    pub source_file: &'static str,
    pub source_offset: &'static str,
    pub level_type: &'static str,
    pub level_type1: &'static str,
    pub level_type2: &'static str,
    pub level_scale: &'static str,
    pub level_scale1: &'static str,
    pub level_scale2: &'static str,
    pub level_value: &'static str,
    pub level_value1: &'static str,
    pub level_value2: &'static str,
    pub level_l1: &'static str,
    pub level_l2: &'static str,
    pub level_min: &'static str,
    pub level_max: &'static str,
    pub timerange_type: &'static str,
    pub timerange_unit: &'static str,
    pub timerange_p1: &'static str,
    pub timerange_p2: &'static str,
    pub timerange_value: &'static str,
    pub timerange_step_len: &'static str,
    pub timerange_step_unit: &'static str,
    pub timerange_stat_type: &'static str,
    pub timerange_stat_len: &'static str,
    pub timerange_stat_unit: &'static str,
    pub area_id: &'static str,
    pub area_value: &'static str,
    pub bbox_value: &'static str,
    pub proddef_value: &'static str,
    pub value_value: &'static str,
    pub run_value: &'static str,
    pub quantity_value: &'static str,
    pub task_value: &'static str,
    pub assigneddataset_time: &'static str,
    pub assigneddataset_name: &'static str,
    pub assigneddataset_id: &'static str,
    pub note_time: &'static str,
    pub note_value: &'static str,
    pub metadata_items: &'static str,
    pub metadata_notes: &'static str,
    pub summary_items: &'static str,
    pub summary_stats: &'static str,
    pub summary_desc: &'static str,
    pub summarystats_begin: &'static str,
    pub summarystats_end: &'static str,
    pub summarystats_count: &'static str,
    pub summarystats_size: &'static str,
}

/// Short keys, used by the compact JSON wire form.
pub const KEYS_JSON: Keys = Keys {
    type_name: "t",
    type_desc: "desc",
    type_style: "s",
    reftime_position_time: "ti",
    reftime_period_begin: "b",
    reftime_period_end: "e",
    origin_centre: "ce",
    origin_subcentre: "sc",
    origin_process: "pr",
    origin_process_type: "pt",
    origin_background_process_id: "bi",
    origin_process_id: "pi",
    origin_wmo: "wmo",
    origin_rad: "rad",
    origin_plc: "plc",
    product_origin: "or",
    product_table: "ta",
    product_product: "pr",
    product_centre: "ce",
    product_discipline: "di",
    product_category: "ca",
    product_number: "no",
    product_table_version: "tv",
    product_local_table_version: "ltv",
    product_type: "ty",
    product_subtype: "st",
    product_local_subtype: "ls",
    product_value: "va",
    product_object: "ob",
    product_id: "id",
    source_format: "f",
    source_size: "sz",
    source_url: "url",
    source_basedir: "b",
    source_file: "file",
    source_offset: "ofs",
    level_type: "lt",
    level_type1: "lt1",
    level_type2: "lt2",
    level_scale: "sc",
    level_scale1: "s1",
    level_scale2: "s2",
    level_value: "va",
    level_value1: "v1",
    level_value2: "v2",
    level_l1: "l1",
    level_l2: "l2",
    level_min: "mi",
    level_max: "ma",
    timerange_type: "ty",
    timerange_unit: "un",
    timerange_p1: "p1",
    timerange_p2: "p2",
    timerange_value: "va",
    timerange_step_len: "sl",
    timerange_step_unit: "su",
    timerange_stat_type: "pt",
    timerange_stat_len: "pl",
    timerange_stat_unit: "pu",
    area_id: "id",
    area_value: "va",
    bbox_value: "va",
    proddef_value: "va",
    value_value: "va",
    run_value: "va",
    quantity_value: "va",
    task_value: "va",
    assigneddataset_time: "ti",
    assigneddataset_name: "na",
    assigneddataset_id: "id",
    note_time: "ti",
    note_value: "va",
    metadata_items: "i",
    metadata_notes: "n",
    summary_items: "items",
    summary_stats: "summarystats",
    summary_desc: "desc",
    summarystats_begin: "b",
    summarystats_end: "e",
    summarystats_count: "c",
    summarystats_size: "s",
};

/// Long keys, used by the human-readable/Python-facing structured form.
pub const KEYS_PYTHON: Keys = Keys {
    type_name: "type",
    type_desc: "desc",
    type_style: "style",
    reftime_position_time: "time",
    reftime_period_begin: "begin",
    reftime_period_end: "end",
    origin_centre: "centre",
    origin_subcentre: "subcentre",
    origin_process: "process",
    origin_process_type: "process_type",
    origin_background_process_id: "background_process_id",
    origin_process_id: "process_id",
    origin_wmo: "wmo",
    origin_rad: "rad",
    origin_plc: "plc",
    product_origin: "origin",
    product_table: "table",
    product_product: "product",
    product_centre: "centre",
    product_discipline: "discipline",
    product_category: "category",
    product_number: "number",
    product_table_version: "table_version",
    product_local_table_version: "local_table_version",
    product_type: "type",
    product_subtype: "subtype",
    product_local_subtype: "local_subtype",
    product_value: "value",
    product_object: "object",
    product_id: "id",
    source_format: "format",
    source_size: "size",
    source_url: "url",
    source_basedir: "basedir",
    source_file: "file",
    source_offset: "offset",
    level_type: "level_type",
    level_type1: "level_type1",
    level_type2: "level_type2",
    level_scale: "scale",
    level_scale1: "scale1",
    level_scale2: "scale2",
    level_value: "value",
    level_value1: "value1",
    level_value2: "value2",
    level_l1: "l1",
    level_l2: "l2",
    level_min: "min",
    level_max: "max",
    timerange_type: "trange_type",
    timerange_unit: "unit",
    timerange_p1: "p1",
    timerange_p2: "p2",
    timerange_value: "value",
    timerange_step_len: "step_len",
    timerange_step_unit: "step_unit",
    timerange_stat_type: "stat_type",
    timerange_stat_len: "stat_len",
    timerange_stat_unit: "stat_unit",
    area_id: "id",
    area_value: "value",
    bbox_value: "value",
    proddef_value: "value",
    value_value: "value",
    run_value: "value",
    quantity_value: "value",
    task_value: "value",
    assigneddataset_time: "time",
    assigneddataset_name: "name",
    assigneddataset_id: "id",
    note_time: "time",
    note_value: "value",
    metadata_items: "items",
    metadata_notes: "notes",
    summary_items: "items",
    summary_stats: "summarystats",
    summary_desc: "desc",
    summarystats_begin: "begin",
    summarystats_end: "end",
    summarystats_count: "count",
    summarystats_size: "size",
};

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn json_and_python_agree_on_shared_names() {
        assert_eq!(KEYS_JSON.area_id, KEYS_PYTHON.area_id);
        assert_ne!(KEYS_JSON.type_name, KEYS_PYTHON.type_name);
    }
}
