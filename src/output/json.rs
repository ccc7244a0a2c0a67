//! JSON output format.

use serde::Serialize;
use std::io::Write;

use super::summary::Summary;
use crate::parser::DecoupledLightmap;

/// Write a container summary as JSON.
pub fn write_json<W: Write>(summary: &Summary, writer: W, pretty: bool) -> Result<(), serde_json::Error> {
    write_value(summary, writer, pretty)
}

/// Write decoupled lightmap records as a JSON array.
pub fn write_lightmaps_json<W: Write>(
    lightmaps: &[DecoupledLightmap],
    writer: W,
    pretty: bool,
) -> Result<(), serde_json::Error> {
    write_value(lightmaps, writer, pretty)
}

/// Render a summary as a JSON string.
pub fn to_json_string(summary: &Summary, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(summary)
    } else {
        serde_json::to_string(summary)
    }
}

fn write_value<T: Serialize + ?Sized, W: Write>(value: &T, writer: W, pretty: bool) -> Result<(), serde_json::Error> {
    if pretty {
        serde_json::to_writer_pretty(writer, value)
    } else {
        serde_json::to_writer(writer, value)
    }
}
