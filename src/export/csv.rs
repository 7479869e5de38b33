use std::borrow::Cow;

use crate::{Channel, MotionData};

const ROW_TERMINATOR: &str = "\r\n";

/// Header fields: `frame` then six channels per bone, prefixed with the bone
/// name when more than one bone is exported
pub fn csv_header(bones: &[String]) -> Vec<String> {
    let mut header = Vec::with_capacity(1 + bones.len() * Channel::ALL.len());
    header.push("frame".to_owned());
    if let [_] = bones {
        header.extend(Channel::ALL.iter().map(|x| x.column().to_owned()));
    } else {
        for bone in bones {
            header.extend(
                Channel::ALL
                    .iter()
                    .map(|x| format!("{bone}_{}", x.column())),
            );
        }
    }
    header
}

fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\"")).into()
    } else {
        field.into()
    }
}

fn push_row<'a>(out: &mut String, fields: impl IntoIterator<Item = &'a str>) {
    for (index, field) in fields.into_iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        out.push_str(&escape_field(field));
    }
    out.push_str(ROW_TERMINATOR);
}

/// One row per record. Values are printed with exactly `precision` decimals;
/// cells of a skipped bone are left empty.
pub fn render_csv(motion: &MotionData) -> String {
    let precision = motion.precision as usize;
    let mut out = String::new();

    let header = csv_header(&motion.bones);
    push_row(&mut out, header.iter().map(|x| x.as_str()));

    let mut row: Vec<String> = Vec::with_capacity(header.len());
    for record in motion.records.iter() {
        row.clear();
        row.push(record.frame.to_string());
        for value in record.values.iter() {
            match value {
                Some(sample) => row.extend(
                    sample
                        .channels()
                        .iter()
                        .map(|x| format!("{x:.precision$}")),
                ),
                None => row.extend(Channel::ALL.iter().map(|_| String::new())),
            }
        }
        push_row(&mut out, row.iter().map(|x| x.as_str()));
    }

    out
}
