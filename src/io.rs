use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use bzip2::read::BzDecoder;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use ndarray::Array2;
use polars::prelude::*;
use tempfile::NamedTempFile;
use tracing::info;

use crate::df_utils::{
    ensure_f64, ensure_utf8, f64_values, frame_from_columns, i64_values, require_columns,
    with_row_index,
};
use crate::error::RvSimError;
use crate::types::{
    HaplotypeMatrix, LEGEND_ALT, LEGEND_FUN, LEGEND_GENE, LEGEND_ID, LEGEND_REF, LEGEND_ROW,
    MacBin,
};

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

pub fn read_table(path: &Path) -> Result<DataFrame> {
    let ext = extension(path);
    if ext == "gz" || ext == "bz2" {
        let tmp = decompress_to_temp(path)?;
        return read_table_plain(tmp.path());
    }
    read_table_plain(path)
}

fn read_table_plain(path: &Path) -> Result<DataFrame> {
    let delimiter = detect_delimiter(path)?;
    if delimiter == b' ' {
        let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
        return read_table_whitespace(BufReader::new(file));
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(delimiter)
                .with_null_values(Some(NullValues::AllColumns(vec![
                    "".into(),
                    "NA".into(),
                ])))
                .with_missing_is_null(true),
        )
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
        .with_context(|| format!("read {}", path.display()))?;
    trim_string_columns(df)
}

fn read_table_whitespace<R: BufRead>(mut reader: R) -> Result<DataFrame> {
    let mut header_line = String::new();
    reader.read_line(&mut header_line)?;
    if header_line.trim().is_empty() {
        return Err(anyhow::anyhow!("empty table"));
    }
    let headers: Vec<&str> = header_line.split_whitespace().collect();
    let mut columns: Vec<Vec<String>> = vec![Vec::new(); headers.len()];

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        for col in columns.iter_mut() {
            col.push(parts.next().unwrap_or_default().to_string());
        }
    }

    let height = columns.first().map(Vec::len).unwrap_or(0);
    let cols: Vec<Column> = headers
        .iter()
        .zip(columns)
        .map(|(name, values)| Series::new((*name).into(), values).into())
        .collect();
    frame_from_columns(height, cols)
}

fn detect_delimiter(path: &Path) -> Result<u8> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut first = String::new();
    BufReader::new(file).read_line(&mut first)?;
    if first.contains('\t') {
        return Ok(b'\t');
    }
    if first.contains(',') {
        return Ok(b',');
    }
    Ok(b' ')
}

fn open_maybe_compressed(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    Ok(match extension(path).as_str() {
        "gz" => Box::new(GzDecoder::new(file)),
        "bz2" => Box::new(BzDecoder::new(file)),
        _ => Box::new(file),
    })
}

fn decompress_to_temp(path: &Path) -> Result<NamedTempFile> {
    let mut decoder = open_maybe_compressed(path)?;
    let mut tmp = NamedTempFile::new()?;
    std::io::copy(&mut decoder, &mut tmp).with_context(|| format!("decompress {}", path.display()))?;
    Ok(tmp)
}

fn trim_string_columns(mut df: DataFrame) -> Result<DataFrame> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    for name in names {
        if let Ok(column) = df.column(&name)
            && column.dtype() == &DataType::String
        {
            let mut trimmed = column
                .str()?
                .apply(|v| v.map(|s| Cow::Owned(s.trim().to_string())))
                .into_series();
            trimmed.rename(name.as_str().into());
            df.with_column(trimmed.into_column())?;
        }
    }
    Ok(df)
}

pub fn read_legend(path: &Path) -> Result<DataFrame> {
    let legend = read_table(path)?;
    require_columns(
        &legend,
        &[LEGEND_ID, LEGEND_GENE, LEGEND_FUN, LEGEND_REF, LEGEND_ALT],
    )
    .with_context(|| format!("legend {}", path.display()))?;
    let legend = ensure_utf8(
        legend,
        &[LEGEND_ID, LEGEND_GENE, LEGEND_FUN, LEGEND_REF, LEGEND_ALT],
    )?;
    let legend = with_row_index(legend, LEGEND_ROW)?;
    info!("Read legend with {} variants from {}", legend.height(), path.display());
    Ok(legend)
}

/// Reads a header-less haplotype file: one variant per line, one 0/1 allele
/// per haplotype separated by whitespace.
pub fn read_haplotypes(path: &Path) -> Result<HaplotypeMatrix> {
    let reader = BufReader::new(open_maybe_compressed(path)?);
    let mut values = Vec::new();
    let mut width: Option<usize> = None;
    let mut rows = 0usize;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let before = values.len();
        for token in line.split_whitespace() {
            let allele = match token {
                "0" => 0u8,
                "1" => 1u8,
                other => {
                    return Err(RvSimError::InvalidArgument(format!(
                        "{}:{}: haplotype value '{other}' is not 0 or 1",
                        path.display(),
                        line_no + 1
                    ))
                    .into());
                }
            };
            values.push(allele);
        }
        let row_width = values.len() - before;
        match width {
            None => width = Some(row_width),
            Some(w) if w != row_width => {
                return Err(RvSimError::ShapeMismatch(format!(
                    "{}:{}: expected {w} haplotypes, found {row_width}",
                    path.display(),
                    line_no + 1
                ))
                .into());
            }
            Some(_) => {}
        }
        rows += 1;
    }

    let haps = Array2::from_shape_vec((rows, width.unwrap_or(0)), values)
        .context("shape haplotype matrix")?;
    info!(
        "Read {} variants x {} haplotypes from {}",
        haps.nrows(),
        haps.ncols(),
        path.display()
    );
    Ok(haps)
}

pub fn read_mac_bins(path: &Path) -> Result<Vec<MacBin>> {
    let df = read_table(path)?;
    require_columns(&df, &["Lower", "Upper", "Expected_var"])
        .with_context(|| format!("MAC bin table {}", path.display()))?;
    let df = ensure_f64(df, &["Expected_var"])?;
    let lower = i64_values(&df, "Lower")?;
    let upper = i64_values(&df, "Upper")?;
    let expected = f64_values(&df, "Expected_var")?;

    lower
        .into_iter()
        .zip(upper)
        .zip(expected)
        .map(|((lo, hi), expected_var)| -> Result<MacBin> {
            let bound = |v: i64| {
                u32::try_from(v).map_err(|_| {
                    RvSimError::InvalidArgument(format!("MAC bin bound {v} is not a count"))
                })
            };
            Ok(MacBin {
                lower: bound(lo)?,
                upper: bound(hi)?,
                expected_var,
            })
        })
        .collect()
}

fn write_haplotype_rows<W: Write>(haps: &HaplotypeMatrix, writer: &mut W) -> Result<()> {
    for row in haps.rows() {
        let line = row
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(writer, "{line}")?;
    }
    Ok(())
}

pub fn write_haplotypes(haps: &HaplotypeMatrix, path: &Path, gzip: bool) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    if gzip {
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        write_haplotype_rows(haps, &mut encoder)?;
        encoder.finish()?.flush()?;
    } else {
        let mut writer = BufWriter::new(file);
        write_haplotype_rows(haps, &mut writer)?;
        writer.flush()?;
    }
    Ok(())
}

pub fn write_dataframe(df: &DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut df = df.clone();
    CsvWriter::new(&mut file)
        .with_separator(b'\t')
        .finish(&mut df)
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
