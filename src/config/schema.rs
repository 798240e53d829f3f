use serde_json::{json, Value};
use std::sync::LazyLock;

pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "server": {
                "type": "object",
                "properties": {
                    "host": { "type": "string" },
                    "port": { "type": "integer", "minimum": 1, "maximum": 65535 },
                    "db_path": { "type": "string" }
                }
            },
            "pipeline": {
                "type": "object",
                "properties": {
                    "human_review": { "type": "boolean" },
                    "hitl_timeout_secs": { "type": ["integer", "null"], "minimum": 1 },
                    "max_file_bytes": { "type": "integer", "minimum": 1 },
                    "exclude_dirs": { "type": "array", "items": { "type": "string" } },
                    "include": { "type": "array", "items": { "type": "string" } }
                }
            },
            "scoring": {
                "type": "object",
                "properties": {
                    "weights": {
                        "type": "object",
                        "properties": {
                            "structural": { "$ref": "#/$defs/unit" },
                            "semantic": { "$ref": "#/$defs/unit" },
                            "recency": { "$ref": "#/$defs/unit" },
                            "completeness": { "$ref": "#/$defs/unit" }
                        }
                    },
                    "penalties": {
                        "type": "object",
                        "properties": {
                            "critical": { "type": "number", "minimum": 0 },
                            "major": { "type": "number", "minimum": 0 },
                            "minor": { "type": "number", "minimum": 0 }
                        }
                    },
                    "critical_below": { "type": "number", "minimum": 0, "maximum": 100 },
                    "major_below": { "type": "number", "minimum": 0, "maximum": 100 },
                    "recency_window_days": { "type": "number", "exclusiveMinimum": 0 },
                    "recency_floor": { "$ref": "#/$defs/unit" },
                    "unparseable_recency": { "$ref": "#/$defs/unit" },
                    "completeness_floor": { "$ref": "#/$defs/unit" },
                    "completeness_divisor": { "type": "number", "exclusiveMinimum": 0 },
                    "confidence_floor": { "$ref": "#/$defs/unit" },
                    "confidence_step": { "$ref": "#/$defs/unit" },
                    "max_signal_units": { "type": "integer", "minimum": 0 },
                    "dated_confidence_bonus": { "$ref": "#/$defs/unit" },
                    "confidence_cap": { "$ref": "#/$defs/unit" }
                }
            }
        },
        "$defs": {
            "unit": { "type": "number", "minimum": 0, "maximum": 1 }
        }
    })
});
