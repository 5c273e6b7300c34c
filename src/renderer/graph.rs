/// Call network as a Graphviz DOT description.
///
/// Nodes are all tracked users, whether or not they took part in a call.
/// Each call adds one undirected edge per pair of distinct tracked
/// participants, so repeated collaborations show up as parallel edges.
use crate::directory::UserDirectory;
use crate::history::CallEvent;

use super::calls::{tracked_calls, tracked_participants};
use super::ReportSection;

pub fn render_call_graph(calls: &[CallEvent], directory: &UserDirectory) -> ReportSection {
    let mut section = ReportSection::default();
    section.push("graph calls {");

    for user in directory.iter() {
        section.push(format!(
            "    \"{}\" [label=\"{}\"];",
            escape(&user.user_id),
            escape(&user.real_name)
        ));
    }

    for (call, _initiator) in tracked_calls(calls, directory) {
        let participants: Vec<&str> = tracked_participants(call, directory)
            .map(|user| user.user_id.as_str())
            .collect();
        for (i, left) in participants.iter().enumerate() {
            for right in &participants[i + 1..] {
                section.push(format!(
                    "    \"{}\" -- \"{}\";",
                    escape(left),
                    escape(right)
                ));
            }
        }
    }

    section.push("}");
    section
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
