//! CSV export: `id,key,<parameters...>,<views...>`

use crate::dataset::{DatasetMeta, Item};
use std::io::{self, Write};

pub fn write<W: Write>(writer: &mut W, items: &[Item], meta: &DatasetMeta) -> io::Result<()> {
    let mut csv = ::csv::Writer::from_writer(writer);

    let mut header = vec!["id".to_string(), "key".to_string()];
    header.extend(meta.parameters.iter().cloned());
    header.extend(meta.views.iter().map(|v| v.key.clone()));
    csv.write_record(&header)?;

    for item in items {
        let mut record = vec![item.id.to_string(), item.key.clone()];
        record.extend(
            meta.parameters
                .iter()
                .map(|p| item.param(p).map(|v| v.to_string()).unwrap_or_default()),
        );
        record.extend(
            meta.views
                .iter()
                .map(|v| item.files.get(&v.key).cloned().unwrap_or_default()),
        );
        csv.write_record(&record)?;
    }

    csv.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::{item, meta};

    #[test]
    fn test_write_rows() {
        let items = vec![
            item(1, &[("x", 1.5), ("y", 2.0)], &[("front", "/res/1/0")]),
            item(2, &[("y", 4.0)], &[("front", "")]),
        ];
        let mut out = Vec::new();
        write(&mut out, &items, &meta(&["front"], &["x", "y"])).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "id,key,x,y,front");
        assert_eq!(lines[1], "1,0-1,1.5,2,/data/front/1.png");
        assert_eq!(lines[2], "2,1-2,,4,");
    }

    #[test]
    fn test_write_quotes_commas() {
        let mut it = item(1, &[], &[]);
        it.files.insert("front".into(), "/data/a,b.png".into());
        let mut out = Vec::new();
        write(&mut out, &[it], &meta(&["front"], &[])).unwrap();

        assert!(String::from_utf8(out).unwrap().contains("\"/data/a,b.png\""));
    }
}
