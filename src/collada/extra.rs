//! Softimage XSI scene timing stored under `<COLLADA><extra>`.

use log::trace;
use roxmltree::Node;
use serde::{Deserialize, Serialize};

use super::text::{attribute, elements, leading_int, tag_name, text};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct XsiExtra {
    pub timing: String,
    pub start: i32,
    pub end: i32,
    pub frame_rate: i32,
}

impl XsiExtra {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One `<xsi_param sid="...">value</xsi_param>` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XsiParam {
    pub sid: Option<String>,
    pub value: String,
}

/// Reads every `technique/si_scene/xsi_param` under `extra` into `target`.
///
/// Unless `fix_sids` is set every field is matched against the `timing`
/// sid, so only `timing` is ever assigned.
pub fn read_extra(extra: &Node<'_, '_>, target: &mut XsiExtra, fix_sids: bool) {
    for technique in elements(extra).filter(|n| tag_name(n) == "technique") {
        for si_scene in elements(&technique).filter(|n| tag_name(n) == "si_scene") {
            for param in si_scene_params(&si_scene) {
                apply_param(&param, target, fix_sids);
            }
        }
    }
}

fn si_scene_params(si_scene: &Node<'_, '_>) -> Vec<XsiParam> {
    elements(si_scene)
        .filter(|n| tag_name(n) == "xsi_param")
        .map(|n| XsiParam {
            sid: attribute(&n, "sid"),
            value: text(&n),
        })
        .collect()
}

fn apply_param(param: &XsiParam, target: &mut XsiExtra, fix_sids: bool) {
    let Some(sid) = param.sid.as_deref() else {
        return;
    };
    let (start_sid, end_sid, frame_rate_sid) = if fix_sids {
        ("start", "end", "frame_rate")
    } else {
        ("timing", "timing", "timing")
    };

    if sid == "timing" {
        target.timing = param.value.clone();
    } else if sid == start_sid {
        target.start = leading_int(&param.value);
    } else if sid == end_sid {
        target.end = leading_int(&param.value);
    } else if sid == frame_rate_sid {
        target.frame_rate = leading_int(&param.value);
    } else {
        trace!("ignoring xsi_param {sid}");
    }
}
