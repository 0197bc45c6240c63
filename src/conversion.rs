use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{DevkitError, Result};
use crate::types::{
    AnnotationRecord, BoundingBox, GtsrbRow, CSV_COLUMNS, DATABASE_NAME, IMAGE_DEPTH, UNDEFINED,
};
use crate::utils::{annotation_file_name, synthesize_image_name};

/// Path of the ground-truth CSV for a class directory: `<root>/<class>/GT-<class>.csv`
pub fn gtsrb_csv_path(root_dir: &Path, class_label: &str) -> PathBuf {
    root_dir
        .join(class_label)
        .join(format!("GT-{}.csv", class_label))
}

/// Open a GTSRB ground-truth CSV: `;` separated, quoted fields, header row skipped
pub fn open_gtsrb_csv(path: &Path) -> Result<csv::Reader<File>> {
    if !path.is_file() {
        return Err(DevkitError::MissingInputFile {
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path).map_err(|_| DevkitError::MissingInputFile {
        path: path.to_path_buf(),
    })?;

    Ok(ReaderBuilder::new()
        .delimiter(b';')
        .quote(b'"')
        .trim(Trim::All)
        .has_headers(true)
        // Column count is checked per row so the error can name the row
        .flexible(true)
        .from_reader(file))
}

/// Decode one CSV record into a named row. `row` is the 1-based data row index.
pub fn decode_row(file: &Path, row: usize, record: &StringRecord) -> Result<GtsrbRow> {
    if record.len() != CSV_COLUMNS {
        return Err(DevkitError::MalformedRow {
            file: file.to_path_buf(),
            row,
            reason: format!("expected {} columns, found {}", CSV_COLUMNS, record.len()),
        });
    }
    record
        .deserialize::<GtsrbRow>(None)
        .map_err(|e| DevkitError::MalformedRow {
            file: file.to_path_buf(),
            row,
            reason: e.to_string(),
        })
}

impl AnnotationRecord {
    pub fn from_row(class_label: &str, row: &GtsrbRow) -> Self {
        Self {
            original_file_name: row.filename.clone(),
            class_label: class_label.to_string(),
            width: row.width.clone(),
            height: row.height.clone(),
            bndbox: BoundingBox {
                xmin: row.roi_x1.clone(),
                ymin: row.roi_y1.clone(),
                xmax: row.roi_x2.clone(),
                ymax: row.roi_y2.clone(),
            },
            image_name: synthesize_image_name(class_label, &row.filename),
        }
    }

    /// Name of the XML file this record is written to
    pub fn annotation_file_name(&self) -> String {
        annotation_file_name(&self.image_name)
    }
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn push_indent(xml: &mut String, depth: usize) {
    for _ in 0..depth {
        xml.push_str("    ");
    }
}

fn push_element(xml: &mut String, depth: usize, tag: &str, value: impl ToString) {
    push_indent(xml, depth);
    xml.push_str(&format!(
        "<{}>{}</{}>\n",
        tag,
        escape_xml(&value.to_string()),
        tag
    ));
}

fn open_tag(xml: &mut String, depth: usize, tag: &str) {
    push_indent(xml, depth);
    xml.push_str(&format!("<{}>\n", tag));
}

fn close_tag(xml: &mut String, depth: usize, tag: &str) {
    push_indent(xml, depth);
    xml.push_str(&format!("</{}>\n", tag));
}

/// Serialize a record into the fixed annotation layout
pub fn convert_to_xml(record: &AnnotationRecord) -> String {
    let mut xml = String::with_capacity(1024);
    let class = record.class_label.as_str();

    open_tag(&mut xml, 0, "annotation");
    push_element(&mut xml, 1, "folderName", class);
    push_element(
        &mut xml,
        1,
        "fileName",
        format!("{}/{}", class, record.original_file_name),
    );

    open_tag(&mut xml, 1, "source");
    push_element(&mut xml, 2, "database", DATABASE_NAME);
    push_element(&mut xml, 2, "annotation", UNDEFINED);
    push_element(&mut xml, 2, "image", &record.image_name);
    push_element(&mut xml, 2, "flickrid", UNDEFINED);
    close_tag(&mut xml, 1, "source");

    open_tag(&mut xml, 1, "owner");
    push_element(&mut xml, 2, "flickrid", UNDEFINED);
    push_element(&mut xml, 2, "name", class);
    close_tag(&mut xml, 1, "owner");

    open_tag(&mut xml, 1, "size");
    push_element(&mut xml, 2, "width", &record.width);
    push_element(&mut xml, 2, "height", &record.height);
    push_element(&mut xml, 2, "depth", IMAGE_DEPTH);
    close_tag(&mut xml, 1, "size");

    push_element(&mut xml, 1, "segmented", UNDEFINED);

    open_tag(&mut xml, 1, "object");
    push_element(&mut xml, 2, "name", class);
    push_element(&mut xml, 2, "pose", UNDEFINED);
    push_element(&mut xml, 2, "truncated", UNDEFINED);
    push_element(&mut xml, 2, "difficult", UNDEFINED);
    open_tag(&mut xml, 2, "bndbox");
    push_element(&mut xml, 3, "xmin", &record.bndbox.xmin);
    push_element(&mut xml, 3, "ymin", &record.bndbox.ymin);
    push_element(&mut xml, 3, "xmax", &record.bndbox.xmax);
    push_element(&mut xml, 3, "ymax", &record.bndbox.ymax);
    close_tag(&mut xml, 2, "bndbox");
    close_tag(&mut xml, 1, "object");

    close_tag(&mut xml, 0, "annotation");
    xml
}

/// Write the record's XML file into `annotations_dir`, replacing any previous version
pub fn write_annotation(record: &AnnotationRecord, annotations_dir: &Path) -> Result<PathBuf> {
    let output_path = annotations_dir.join(record.annotation_file_name());
    let file = File::create(&output_path).map_err(|e| DevkitError::io(&output_path, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(convert_to_xml(record).as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| DevkitError::io(&output_path, e))?;
    Ok(output_path)
}

/// Copy the record's source image from `<root>/<class>/<file>` to `<images_dir>/<image_name>`
pub fn copy_image(record: &AnnotationRecord, root_dir: &Path, images_dir: &Path) -> Result<PathBuf> {
    let source_path = root_dir
        .join(&record.class_label)
        .join(&record.original_file_name);
    if !source_path.is_file() {
        return Err(DevkitError::MissingInputFile { path: source_path });
    }
    // Failing to read the source is local to the class, failing to write is not
    let mut source = match File::open(&source_path) {
        Ok(file) => file,
        Err(_) => return Err(DevkitError::MissingInputFile { path: source_path }),
    };
    let destination = images_dir.join(&record.image_name);
    let mut output =
        File::create(&destination).map_err(|e| DevkitError::io(&destination, e))?;
    std::io::copy(&mut source, &mut output)
        .and_then(|_| output.flush())
        .map_err(|e| DevkitError::io(&destination, e))?;
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> GtsrbRow {
        GtsrbRow {
            filename: "00000_00001.ppm".to_string(),
            width: "30".to_string(),
            height: "031".to_string(),
            roi_x1: "5".to_string(),
            roi_y1: "06".to_string(),
            roi_x2: "25".to_string(),
            roi_y2: "26".to_string(),
            class_id: "14".to_string(),
        }
    }

    #[test]
    fn test_record_from_row_passes_fields_through() {
        let record = AnnotationRecord::from_row("00014", &sample_row());
        assert_eq!(record.image_name, "00014_00000_00001.ppm");
        assert_eq!(record.width, "30");
        assert_eq!(record.height, "031");
        assert_eq!(
            record.bndbox,
            BoundingBox {
                xmin: "5".to_string(),
                ymin: "06".to_string(),
                xmax: "25".to_string(),
                ymax: "26".to_string()
            }
        );
        assert_eq!(record.annotation_file_name(), "00014_00000_00001.xml");
    }

    #[test]
    fn test_convert_to_xml_layout() {
        let record = AnnotationRecord::from_row("00014", &sample_row());
        let xml = convert_to_xml(&record);

        let expected_order = [
            "<annotation>",
            "<folderName>00014</folderName>",
            "<fileName>00014/00000_00001.ppm</fileName>",
            "<source>",
            "<database>GTRSB</database>",
            "<annotation>UNDEFINED</annotation>",
            "<image>00014_00000_00001.ppm</image>",
            "<flickrid>UNDEFINED</flickrid>",
            "</source>",
            "<owner>",
            "<flickrid>UNDEFINED</flickrid>",
            "<name>00014</name>",
            "</owner>",
            "<size>",
            "<width>30</width>",
            "<height>031</height>",
            "<depth>3</depth>",
            "</size>",
            "<segmented>UNDEFINED</segmented>",
            "<object>",
            "<name>00014</name>",
            "<pose>UNDEFINED</pose>",
            "<truncated>UNDEFINED</truncated>",
            "<difficult>UNDEFINED</difficult>",
            "<bndbox>",
            "<xmin>5</xmin>",
            "<ymin>06</ymin>",
            "<xmax>25</xmax>",
            "<ymax>26</ymax>",
            "</bndbox>",
            "</object>",
            "</annotation>",
        ];
        let lines: Vec<&str> = xml.lines().map(str::trim).collect();
        assert_eq!(lines, expected_order);
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a&b<c>\"d'"), "a&amp;b&lt;c&gt;&quot;d&apos;");
    }

    #[test]
    fn test_decode_row_rejects_wrong_column_count() {
        let record = StringRecord::from(vec!["a.ppm", "1", "2"]);
        let err = decode_row(Path::new("GT-00000.csv"), 4, &record).unwrap_err();
        match err {
            DevkitError::MalformedRow { row, reason, .. } => {
                assert_eq!(row, 4);
                assert!(reason.contains("found 3"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_decode_row_keeps_field_text() {
        let record =
            StringRecord::from(vec!["a.ppm", "030", "+31", "05", "6.0", "025", "026", "0"]);
        let row = decode_row(Path::new("GT-00000.csv"), 1, &record).unwrap();
        assert_eq!(row.width, "030");
        assert_eq!(row.height, "+31");
        assert_eq!(row.roi_x1, "05");
        assert_eq!(row.roi_y1, "6.0");
    }
}
