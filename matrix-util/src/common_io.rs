use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

///
/// Read every line of the input_file into memory, skipping `#` and
/// `%` comment lines
///
/// * `input_file` - file name--either gzipped or not
///
pub fn read_lines(input_file_path: &str) -> anyhow::Result<Vec<Box<str>>> {
    let buf: Box<dyn BufRead> = open_buf_reader(input_file_path)?;
    let mut lines = vec![];
    for x in buf.lines() {
        let x = x?;
        if x.starts_with('#') || x.starts_with('%') {
            continue;
        }
        lines.push(x.into_boxed_str());
    }
    Ok(lines)
}

///
/// Read one name per line (the first whitespace-separated word),
/// e.g., cell barcodes or gene symbols
///
/// * `input_file` - file name--either gzipped or not
///
pub fn read_names(input_file_path: &str) -> anyhow::Result<Vec<Box<str>>> {
    let names: Vec<Box<str>> = read_lines(input_file_path)?
        .iter()
        .filter_map(|line| line.split_whitespace().next().map(Box::from))
        .collect();

    if names.is_empty() {
        anyhow::bail!("no names found in {}", input_file_path);
    }
    Ok(names)
}

///
/// Read lines and split them into words
///
/// * `input_file` - file name--either gzipped or not
/// * `hdr_line` - location of a header line (-1 = no header line)
///
/// Returns (lines of words, header words)
pub fn read_lines_of_words(
    input_file: &str,
    hdr_line: i64,
) -> anyhow::Result<(Vec<Vec<Box<str>>>, Vec<Box<str>>)> {
    let lines = read_lines(input_file)?;

    let split = |line: &str| -> Vec<Box<str>> { line.split_whitespace().map(Box::from).collect() };

    if hdr_line < 0 {
        return Ok((lines.iter().map(|s| split(s)).collect(), vec![]));
    }

    let n_skip = hdr_line as usize;
    if lines.len() < n_skip + 1 {
        anyhow::bail!("not enough lines in {}", input_file);
    }

    let header = split(&lines[n_skip]);
    let words = lines[(n_skip + 1)..].iter().map(|s| split(s)).collect();
    Ok((words, header))
}

///
/// Write every line into the output_file
///
/// * `lines` - vector of lines
/// * `output_file` - file name--either gzipped or not
///
pub fn write_lines<T>(lines: &[T], output_file_path: &str) -> anyhow::Result<()>
where
    T: std::fmt::Display,
{
    let mut buf = open_buf_writer(output_file_path)?;
    for line in lines {
        if let Err(e) = writeln!(buf, "{}", line) {
            if e.kind() == std::io::ErrorKind::BrokenPipe {
                return Ok(());
            } else {
                return Err(anyhow::anyhow!("unexpected error: {}", e));
            }
        }
    }
    buf.flush()?;
    Ok(())
}

///
/// Open a file for reading, and return a buffered reader
/// * `input_file` - file name--either gzipped or not
pub fn open_buf_reader(input_file: &str) -> anyhow::Result<Box<dyn BufRead>> {
    let file = File::open(input_file)
        .map_err(|e| anyhow::anyhow!("failed to open {}: {}", input_file, e))?;

    match Path::new(input_file).extension().and_then(|x| x.to_str()) {
        Some("gz") => Ok(Box::new(BufReader::new(GzDecoder::new(file)))),
        _ => Ok(Box::new(BufReader::new(file))),
    }
}

///
/// Open a file for writing, and return a buffered writer
/// * `output_file` - file name--either gzipped or not; `stdout` also works
pub fn open_buf_writer(output_file: &str) -> anyhow::Result<Box<dyn Write>> {
    if output_file.eq_ignore_ascii_case("stdout") {
        return Ok(Box::new(BufWriter::new(std::io::stdout())));
    }

    mkdir(output_file)?;

    let file = File::create(output_file)?;
    match Path::new(output_file).extension().and_then(|x| x.to_str()) {
        Some("gz") => {
            let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
            Ok(Box::new(BufWriter::new(encoder)))
        }
        _ => Ok(Box::new(BufWriter::new(file))),
    }
}

///
/// Create the parent directory of a file if needed
/// * `file` - file name
///
pub fn mkdir(file: &str) -> anyhow::Result<()> {
    if let Some(dir) = Path::new(file).parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    Ok(())
}
