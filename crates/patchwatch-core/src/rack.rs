//! The host patch effects are spliced into.
//!
//! A rack holds one column per channel, each built from the same tap template
//! (`adc~ → dac~`) with its audio I/O rewired to that channel.

use std::collections::BTreeMap;

use patchwatch_registry::WidgetRegistry;

use crate::chain::ChannelTaps;
use crate::document::parse_document;
use crate::error::DocumentError;
use crate::graph::PatchGraph;
use crate::loader::PatchLoader;
use crate::socket::Socket;

/// Template for one channel column: input straight to output.
pub const TAP_TEMPLATE: &str = "#N canvas 0 50 450 300 10;
#X obj 10 10 adc~ 1;
#X obj 10 270 dac~ 1;
#X connect 0 0 1 0;
";

/// Horizontal distance between channel columns.
pub const COLUMN_WIDTH: i32 = 150;

/// A generated host patch and the taps of each channel.
#[derive(Debug, Clone)]
pub struct Rack {
    /// The host patch graph.
    pub graph: PatchGraph,
    /// Source and sink of each channel.
    pub taps: BTreeMap<usize, ChannelTaps>,
}

impl Rack {
    /// Builds a rack with `channels` columns.
    pub fn build(registry: &WidgetRegistry, channels: usize) -> Result<Self, DocumentError> {
        let template = parse_document(TAP_TEMPLATE)?;
        let mut graph = PatchGraph::new();
        let mut taps = BTreeMap::new();

        for channel in 0..channels {
            let mut column = PatchLoader::new(registry).for_channel(channel).load(&template)?;
            let (Some(adc), Some(dac)) = (column.find("adc~"), column.find("dac~")) else {
                return Err(DocumentError::Malformed {
                    index: 0,
                    statement: TAP_TEMPLATE.to_string(),
                    reason: "tap template needs adc~ and dac~".to_string(),
                });
            };
            column.graph.translate(COLUMN_WIDTH * channel as i32, 0);
            let offset = graph.append(column.graph);
            taps.insert(
                channel,
                ChannelTaps::new(Socket::new(offset + adc, 0), Socket::new(offset + dac, 0)),
            );
        }

        Ok(Self { graph, taps })
    }
}
