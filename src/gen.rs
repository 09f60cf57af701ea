use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::{self, Write};
use std::time::{Duration, Instant};

use atty::Stream;
use cpu_time::ProcessTime;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::cli::CliCfg;
use crate::tables::{DEGREES, SCHOOLS, SEXES};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

pub fn distro_format<T>(map: &HashMap<T, usize>, upper: usize, bottom: usize) -> String
	where T: std::fmt::Display + std::fmt::Debug + std::clone::Clone + Ord
{
	let mut vec: Vec<(usize, T)> = Vec::with_capacity(map.len());
	for x in map.iter() {
		vec.push((*x.1, x.0.clone()));
	}
	// highest count first, ties by value so output is stable
	vec.sort_by(|x, y| y.0.cmp(&x.0).then_with(|| x.1.cmp(&y.1)));

	let mut msg = String::with_capacity(16);
	if upper + bottom >= vec.len() {
		for x in vec.iter() {
			msg.push_str(&format!("({} x {})", x.1, x.0));
		}
	} else {
		for x in vec[..upper].iter() {
			msg.push_str(&format!("({} x {})", x.1, x.0));
		}
		msg.push_str(&format!("..{}..", vec.len() - (bottom + upper)));
		for x in vec[vec.len() - bottom..].iter() {
			msg.push_str(&format!("({} x {})", x.1, x.0));
		}
	}
	msg
}

#[test]
fn test_distro_format() {
	let mut v: HashMap<&str, usize> = HashMap::new();
	v.insert("M", 3);
	v.insert("F", 3);
	v.insert("X", 1);
	v.insert("Q", 7);

	assert_eq!(distro_format(&v, 4, 0), "(Q x 7)(F x 3)(M x 3)(X x 1)");
	assert_eq!(distro_format(&v, 1, 1), "(Q x 7)..2..(X x 1)");
	assert_eq!(distro_format(&v, 0, 2), "..2..(M x 3)(X x 1)");
	assert_eq!(distro_format(&v, 9, 9), "(Q x 7)(F x 3)(M x 3)(X x 1)");
	assert_eq!(distro_format(&HashMap::<&str, usize>::new(), 2, 2), "");
}

fn mem_metric<'a>(v: usize) -> (f64, &'a str) {
	const METRIC: [&str; 8] = ["B ", "KB", "MB", "GB", "TB", "PB", "EB", "ZB"];

	let mut size = 1usize << 10;
	for m in METRIC.iter() {
		if v < size {
			return (v as f64 / (size >> 10) as f64, *m);
		}
		size = match size.checked_shl(10) {
			Some(s) if s > size => s,
			_ => break,
		};
	}
	(v as f64, "")
}

/// keep only a few significant digits of a simple float value
fn sig_dig(v: f64, digits: usize) -> String {
	let x = format!("{}", v);
	let mut d = String::new();
	let mut count = 0;
	let mut found_pt = false;
	for c in x.chars() {
		if c != '.' {
			count += 1;
		} else {
			if count >= digits { break; }
			found_pt = true;
		}

		d.push(c);

		if count >= digits && found_pt { break; }
	}
	d
}

pub fn mem_metric_digit(v: usize, sig: usize) -> String {
	if v == 0 || v > std::usize::MAX / 2 {
		return format!("{:>width$}", "unknown", width = sig + 3);
	}
	let vt = mem_metric(v);
	format!("{:>width$} {}", sig_dig(vt.0, sig), vt.1, width = sig + 1)
}

#[test]
fn test_mem_metric_digit() {
	for t in &[(0, "unknown"),
		(7, "    7 B "),
		(1024, "    1 KB"),
		(3072 + 512, "  3.5 KB"),
		(1024 * 1023, " 1023 KB"),
		(5usize << 30, "    5 GB")] {
		assert_eq!(mem_metric_digit(t.0, 4), t.1, "mem_metric_digit of {}", t.0);
	}
}

fn secs(d: Duration) -> f64 {
	(d.as_secs() as f64) + (d.subsec_nanos() as f64 / 1_000_000_000.0)
}

/// Write wrapper that remembers how many bytes went through it.
pub struct CountingWriter<W> {
	inner: W,
	pub bytes: usize,
}

impl<W: Write> CountingWriter<W> {
	pub fn new(inner: W) -> CountingWriter<W> {
		CountingWriter { inner, bytes: 0 }
	}
}

impl<W: Write> Write for CountingWriter<W> {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		let sz = self.inner.write(buf)?;
		self.bytes += sz;
		Ok(sz)
	}

	fn flush(&mut self) -> io::Result<()> {
		self.inner.flush()
	}
}

/// Draw a uniform index into `table` and return it with the value found there.
pub fn pick<R: Rng>(rng: &mut R, table: &[&'static str]) -> (usize, &'static str) {
	let i = rng.random_range(0..table.len());
	(i, table[i])
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
	pub id: u64,
	pub degree: &'static str,
	pub school: &'static str,
	pub sex: &'static str,
}

#[derive(Debug, Clone, Default)]
pub struct GenStats {
	pub rows: u64,
	pub bytes: usize,
	pub degree_counts: Vec<usize>,
	pub school_counts: Vec<usize>,
	pub sex_counts: Vec<usize>,
	pub elapsed_secs: f64,
	pub cpu_secs: f64,
}

fn counts_map(table: &[&'static str], counts: &[usize]) -> HashMap<&'static str, usize> {
	table.iter().cloned().zip(counts.iter().cloned()).collect()
}

impl GenStats {
	pub fn report(&self, mem: usize) -> String {
		let rate = if self.elapsed_secs > 0.0 {
			(self.bytes as f64 / self.elapsed_secs) as usize
		} else {
			0
		};
		let mut msg = format!(
			"rows: {}  bytes: {}  rate: {}/s  time(sec): {:.3}  cpu(sec): {:.3}  mem: {}\n",
			self.rows,
			mem_metric_digit(self.bytes, 4),
			mem_metric_digit(rate, 4),
			self.elapsed_secs,
			self.cpu_secs,
			mem_metric_digit(mem, 4),
		);
		for (name, table, counts) in &[
			("degree", &DEGREES[..], &self.degree_counts),
			("school", &SCHOOLS[..], &self.school_counts),
			("sex", &SEXES[..], &self.sex_counts)] {
			msg.push_str(&format!("{} distro: {}\n", name, distro_format(&counts_map(table, counts), table.len(), 0)));
		}
		msg
	}
}

pub struct RowGen<R> {
	rng: R,
	cfg: CliCfg,
	degree_counts: Vec<usize>,
	school_counts: Vec<usize>,
	sex_counts: Vec<usize>,
}

impl RowGen<StdRng> {
	pub fn new(cfg: &CliCfg) -> RowGen<StdRng> {
		let rng = match cfg.seed {
			Some(seed) => StdRng::seed_from_u64(seed),
			None => StdRng::from_os_rng(),
		};
		RowGen::with_rng(cfg, rng)
	}
}

impl<R: Rng> RowGen<R> {
	pub fn with_rng(cfg: &CliCfg, rng: R) -> RowGen<R> {
		RowGen {
			rng,
			cfg: cfg.clone(),
			degree_counts: vec![0; DEGREES.len()],
			school_counts: vec![0; SCHOOLS.len()],
			sex_counts: vec![0; SEXES.len()],
		}
	}

	pub fn next_row(&mut self, i: u64) -> Result<Row> {
		let id = match self.cfg.multiplier.checked_mul(i) {
			Some(id) => id,
			None => Err(format!("row id overflow: multiplier {} times row {} does not fit in 64 bits", self.cfg.multiplier, i))?,
		};
		let (di, degree) = pick(&mut self.rng, &DEGREES);
		let (si, school) = pick(&mut self.rng, &SCHOOLS);
		let (xi, sex) = pick(&mut self.rng, &SEXES);
		self.degree_counts[di] += 1;
		self.school_counts[si] += 1;
		self.sex_counts[xi] += 1;
		Ok(Row {
			id,
			degree,
			school,
			sex,
		})
	}

	pub fn write_rows<W: Write>(&mut self, out: W) -> Result<GenStats> {
		let start_f = Instant::now();
		let startcpu = ProcessTime::now();

		let mut wtr = csv::WriterBuilder::new()
			.delimiter(self.cfg.delimiter as u8)
			.has_headers(false)
			.terminator(csv::Terminator::Any(b'\n'))
			.quote_style(csv::QuoteStyle::Necessary)
			.buffer_capacity(self.cfg.buffer_size)
			.from_writer(CountingWriter::new(out));

		let return_or_not = if atty::is(Stream::Stderr) {
			"                          \r"
		} else {
			"\n"
		};

		let year = self.cfg.year.to_string();
		let mut id_buf = String::with_capacity(24);
		for i in 0..self.cfg.rows {
			let row = self.next_row(i)?;
			id_buf.clear();
			write!(id_buf, "{}", row.id)?;
			wtr.write_field(&id_buf)?;
			wtr.write_field(row.degree)?;
			wtr.write_field(row.school)?;
			wtr.write_field(row.sex)?;
			wtr.write_field(&year)?;
			wtr.write_record(None::<&[u8]>)?;

			if self.cfg.verbose > 0 && (i + 1) % self.cfg.progress_every == 0 {
				let sec = secs(start_f.elapsed());
				eprint!(" rows: {}/{}  time(sec): {:.3}  cpu(sec): {:.3}{}",
					i + 1,
					self.cfg.rows,
					sec,
					secs(startcpu.elapsed()),
					return_or_not);
			}
		}
		wtr.flush()?;
		if self.cfg.verbose > 0 && return_or_not != "\n" {
			eprintln!();
		}

		Ok(GenStats {
			rows: self.cfg.rows,
			bytes: wtr.get_ref().bytes,
			degree_counts: self.degree_counts.clone(),
			school_counts: self.school_counts.clone(),
			sex_counts: self.sex_counts.clone(),
			elapsed_secs: secs(start_f.elapsed()),
			cpu_secs: secs(startcpu.elapsed()),
		})
	}
}
