//! Channel determination

use airscope_core::Channel;
use airscope_packet::{element_id, Frame};
use tracing::{debug, info};

/// Channel announced in the DS Parameter Set element, if it fits the plan
///
/// `last_channel` is 11 for the default plan and 13 for the world plan;
/// anything outside `1..=last_channel` is dropped.
pub fn frame_channel(frame: &Frame, last_channel: Channel) -> Option<Channel> {
    let channel = match frame
        .element(element_id::DS_PARAMETER_SET)
        .and_then(|e| e.ds_channel())
    {
        Some(channel) => channel,
        None => {
            debug!("Could not detect AP channel");
            return None;
        }
    };

    if !(1..=last_channel).contains(&channel) {
        info!(channel, last_channel, "AP channel outside the channel plan, skipping");
        return None;
    }

    debug!(channel, "Detected AP channel");
    Some(channel)
}
