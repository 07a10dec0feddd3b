/*!
Message bodies for the external publisher, one per topic.

The bodies are the YAML that `rostopic pub -f` reads. Their layout is also
what [`crate::parser`] reads back, so a published map can be echoed and
converted again without loss.
 */
use std::fmt::Write;

use crate::projection::LocalPoint;
use crate::topics::Topic;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldBlock {
    /// Docking pose with neutral orientation
    Pose { x: f64, y: f64 },
    /// One polygon, open ring, boundary order preserved
    Area { name: String, points: Vec<LocalPoint> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopicMessage {
    pub topic: Topic,
    pub blocks: Vec<FieldBlock>,
}

impl TopicMessage {
    pub fn new(topic: Topic, blocks: Vec<FieldBlock>) -> Self {
        Self { topic, blocks }
    }

    /// Renders the message body.
    ///
    /// Poses are written as they are, area blocks are gathered under an
    /// `areas:` list.
    pub fn body(&self) -> String {
        let mut out = String::new();
        let mut areas_open = false;
        for block in &self.blocks {
            match block {
                FieldBlock::Pose { x, y } => write_pose(&mut out, *x, *y),
                FieldBlock::Area { name, points } => {
                    if !areas_open {
                        out.push_str("areas:\n");
                        areas_open = true;
                    }
                    write_area(&mut out, name, points);
                }
            }
        }
        out
    }
}

fn write_pose(out: &mut String, x: f64, y: f64) {
    // writing into a String cannot fail
    let _ = write!(
        out,
        "position:\n  x: {:.6}\n  y: {:.6}\n  z: 0.0\n\
         orientation:\n  x: 0.0\n  y: 0.0\n  z: 0.0\n  w: 1.0\n",
        x, y
    );
}

fn write_area(out: &mut String, name: &str, points: &[LocalPoint]) {
    let _ = writeln!(out, "  - name: {}", double_quoted(name));
    out.push_str("    area:\n      points:\n");
    for point in points {
        let _ = writeln!(out, "        - {{x: {:.6}, y: {:.6}}}", point.x, point.y);
    }
    out.push_str("    obstacles: []\n");
}

/// YAML double quoted scalar.
fn double_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
