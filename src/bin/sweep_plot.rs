use clap::Parser;
use csv::ReaderBuilder;
use drone_designer::propulsion::PerformanceTable;
use plotters::prelude::*;
use std::fs;
use std::path::PathBuf;

/// Straight segments used to draw the motor limit line.
const LIMIT_SEGMENTS: usize = 48;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Render thrust, motor speed and the motor envelope from a sweep CSV"
)]
struct Cli {
    #[arg(long)]
    input: String,
    #[arg(long, default_value = "artifacts/sweep.png")]
    output: PathBuf,
    /// Design to plot (defaults to the first one in the file)
    #[arg(long)]
    design: Option<String>,
    /// Propeller table drawn under the motor envelope, coloured by airspeed
    #[arg(long)]
    propeller: Option<PathBuf>,
    #[arg(long, default_value_t = 1000)]
    width: u32,
    #[arg(long, default_value_t = 800)]
    height: u32,
}

#[derive(Debug, Clone)]
struct Row {
    velocity_kmh: f64,
    required_n: f64,
    available_n: Option<f64>,
    rpm: f64,
    torque_nm: f64,
    no_load_speed_rev_s: f64,
    stall_torque_nm: f64,
    max_torque_nm: f64,
    valid: bool,
}

impl Row {
    /// Torque the motor can deliver at `speed_rev_s`: the lower of its voltage and current limits.
    fn torque_limit(&self, speed_rev_s: f64) -> f64 {
        let voltage_limited = if speed_rev_s >= self.no_load_speed_rev_s {
            0.0
        } else {
            self.stall_torque_nm * (1.0 - speed_rev_s / self.no_load_speed_rev_s)
        };
        voltage_limited.min(self.max_torque_nm)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (design, mut rows) = read_rows(&cli.input, cli.design.as_deref())?;
    if rows.is_empty() {
        return Err(anyhow::anyhow!("No sweep rows for the requested design"));
    }
    rows.sort_by(|a, b| a.velocity_kmh.total_cmp(&b.velocity_kmh));
    let propeller = cli
        .propeller
        .as_ref()
        .map(PerformanceTable::from_path)
        .transpose()?;

    if let Some(parent) = cli.output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let output_str = cli
        .output
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Output path contains invalid UTF-8"))?;
    let root = BitMapBackend::new(output_str, (cli.width, cli.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let font_family = select_font_family();
    let caption_font = FontDesc::new(font_family, 22.0, FontStyle::Bold);
    let label_font = FontDesc::new(font_family, 16.0, FontStyle::Normal);

    let v_min = rows.first().map(|r| r.velocity_kmh).unwrap_or(0.0);
    let mut v_max = rows.last().map(|r| r.velocity_kmh).unwrap_or(1.0);
    if v_max <= v_min {
        v_max = v_min + 1.0;
    }
    let thrust_max = rows
        .iter()
        .flat_map(|r| [Some(r.required_n), r.available_n])
        .flatten()
        .filter(|t| t.is_finite())
        .fold(0.0, f64::max)
        .max(1e-3)
        * 1.1;
    let rpm_max = rows
        .iter()
        .map(|r| r.rpm)
        .filter(|r| r.is_finite())
        .fold(0.0, f64::max)
        .max(1.0)
        * 1.1;

    let panels = root.split_evenly((3, 1));
    let (upper, middle, lower) = (&panels[0], &panels[1], &panels[2]);

    {
        let mut chart = ChartBuilder::on(upper)
            .margin(20)
            .caption(format!("Thrust per engine: {design}"), caption_font.clone())
            .x_label_area_size(45)
            .y_label_area_size(70)
            .build_cartesian_2d(v_min..v_max, 0.0..thrust_max)?;
        chart
            .configure_mesh()
            .x_desc("Velocity (km/h)")
            .y_desc("Thrust (N)")
            .label_style(label_font.clone())
            .draw()?;

        let required_color = RGBColor(200, 60, 30);
        chart
            .draw_series(LineSeries::new(
                rows.iter().map(|r| (r.velocity_kmh, r.required_n)),
                ShapeStyle::from(&required_color).stroke_width(2),
            ))?
            .label("required")
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], required_color.stroke_width(2))
            });

        let available_color = RGBColor(30, 90, 200);
        chart
            .draw_series(LineSeries::new(
                rows.iter()
                    .filter_map(|r| r.available_n.map(|t| (r.velocity_kmh, t))),
                ShapeStyle::from(&available_color).stroke_width(2),
            ))?
            .label("available")
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], available_color.stroke_width(2))
            });

        chart.draw_series(rows.iter().filter(|r| !r.valid).map(|r| {
            Cross::new(
                (r.velocity_kmh, r.required_n),
                5,
                ShapeStyle::from(&BLACK).stroke_width(2),
            )
        }))?;

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .label_font(label_font.clone())
            .draw()?;
    }

    {
        let mut chart = ChartBuilder::on(middle)
            .margin(20)
            .caption("Motor speed", caption_font.clone())
            .x_label_area_size(45)
            .y_label_area_size(70)
            .build_cartesian_2d(v_min..v_max, 0.0..rpm_max)?;
        chart
            .configure_mesh()
            .x_desc("Velocity (km/h)")
            .y_desc("rpm")
            .label_style(label_font.clone())
            .y_label_formatter(&|v| format!("{v:.0}"))
            .draw()?;
        chart.draw_series(LineSeries::new(
            rows.iter().map(|r| (r.velocity_kmh, r.rpm)),
            ShapeStyle::from(&RGBColor(40, 140, 60)).stroke_width(2),
        ))?;
    }

    draw_motor_envelope(lower, &rows, propeller.as_ref(), caption_font, label_font)?;

    root.present()?;
    Ok(())
}

fn draw_motor_envelope(
    area: &DrawingArea<BitMapBackend<'_>, plotters::coord::Shift>,
    rows: &[Row],
    propeller: Option<&PerformanceTable>,
    caption_font: FontDesc<'_>,
    label_font: FontDesc<'_>,
) -> anyhow::Result<()> {
    let Some(motor) = rows
        .iter()
        .find(|r| r.no_load_speed_rev_s.is_finite() && r.no_load_speed_rev_s > 0.0)
    else {
        return Err(anyhow::anyhow!("Sweep rows carry no motor limit"));
    };

    let operating: Vec<(&Row, (f64, f64))> = rows
        .iter()
        .map(|r| (r, (r.rpm / 60.0, r.torque_nm)))
        .filter(|(_, (n, t))| n.is_finite() && t.is_finite())
        .collect();
    let samples: Vec<(f64, f64, f64)> = propeller
        .map(|table| {
            table
                .samples()
                .map(|s| (s.rpm / 60.0, s.torque_nm, s.velocity_m_s))
                .collect()
        })
        .unwrap_or_default();

    let speed_max = samples
        .iter()
        .map(|(n, _, _)| *n)
        .chain(operating.iter().map(|(_, (n, _))| *n))
        .chain([motor.no_load_speed_rev_s])
        .filter(|n| n.is_finite())
        .fold(0.0, f64::max)
        .max(1.0)
        * 1.05;
    let torque_max = operating
        .iter()
        .map(|(_, (_, t))| *t)
        .chain([motor.max_torque_nm])
        .filter(|t| t.is_finite())
        .fold(0.0, f64::max)
        .max(1e-4)
        * 1.3;
    let velocity_max = samples
        .iter()
        .map(|(_, _, v)| *v)
        .fold(0.0, f64::max)
        .max(1e-6);

    let mut chart = ChartBuilder::on(area)
        .margin(20)
        .caption("Motor envelope", caption_font)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(0.0..speed_max, 0.0..torque_max)?;
    chart
        .configure_mesh()
        .x_desc("Speed (rev/s)")
        .y_desc("Torque (N·m)")
        .label_style(label_font.clone())
        .draw()?;

    chart.draw_series(
        samples
            .iter()
            .filter(|(_, t, _)| *t <= torque_max)
            .map(|&(n, t, v)| Circle::new((n, t), 2, velocity_color(v / velocity_max).filled())),
    )?;

    let limit_color = RGBColor(200, 60, 30);
    let limit = (0..=LIMIT_SEGMENTS)
        .map(|i| motor.no_load_speed_rev_s * i as f64 / LIMIT_SEGMENTS as f64)
        .map(|n| (n, motor.torque_limit(n).min(torque_max)));
    chart
        .draw_series(LineSeries::new(
            limit,
            ShapeStyle::from(&limit_color).stroke_width(2),
        ))?
        .label("motor limit")
        .legend(move |(x, y)| {
            PathElement::new(vec![(x, y), (x + 20, y)], limit_color.stroke_width(2))
        });

    chart
        .draw_series(
            operating
                .iter()
                .filter(|(r, _)| r.valid)
                .map(|&(_, point)| Circle::new(point, 4, BLACK.filled())),
        )?
        .label("operating point")
        .legend(|(x, y)| Circle::new((x + 10, y), 4, BLACK.filled()));
    chart.draw_series(
        operating
            .iter()
            .filter(|(r, _)| !r.valid)
            .map(|&(_, (n, t))| {
                Cross::new((n, t.min(torque_max)), 5, ShapeStyle::from(&BLACK).stroke_width(2))
            }),
    )?;

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font(label_font)
        .draw()?;
    Ok(())
}

/// Blue at rest through red at the fastest tabulated airspeed.
fn velocity_color(fraction: f64) -> RGBColor {
    let f = fraction.clamp(0.0, 1.0);
    let channel = |from: f64, to: f64| (from + (to - from) * f).round() as u8;
    RGBColor(channel(30.0, 220.0), channel(90.0, 50.0), channel(220.0, 40.0))
}

fn select_font_family() -> FontFamily<'static> {
    if cfg!(target_os = "macos") {
        FontFamily::Name("Helvetica")
    } else if cfg!(target_os = "windows") {
        FontFamily::Name("Arial")
    } else {
        FontFamily::Name("DejaVu Sans")
    }
}

fn column(headers: &csv::StringRecord, name: &str) -> anyhow::Result<usize> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(name))
        .ok_or_else(|| anyhow::anyhow!("CSV missing '{}' column", name))
}

fn read_rows(path: &str, requested: Option<&str>) -> anyhow::Result<(String, Vec<Row>)> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let headers = rdr.headers()?.clone();
    let design_idx = column(&headers, "design")?;
    let velocity_idx = column(&headers, "velocity_kmh")?;
    let required_idx = column(&headers, "thrust_per_engine_n")?;
    let available_idx = column(&headers, "available_thrust_n")?;
    let rpm_idx = column(&headers, "rpm")?;
    let torque_idx = column(&headers, "torque_nm")?;
    let no_load_idx = column(&headers, "no_load_speed_rev_s")?;
    let stall_idx = column(&headers, "stall_torque_nm")?;
    let max_torque_idx = column(&headers, "max_torque_nm")?;
    let valid_idx = column(&headers, "valid")?;

    let number = |r: &csv::StringRecord, idx: usize| -> f64 {
        r.get(idx).unwrap_or("").trim().parse().unwrap_or(f64::NAN)
    };

    let mut chosen: Option<String> = requested.map(str::to_string);
    let mut rows = Vec::new();
    for rec in rdr.records() {
        let r = rec?;
        let design = r.get(design_idx).unwrap_or("").to_string();
        let target = chosen.get_or_insert_with(|| design.clone());
        if !target.eq_ignore_ascii_case(&design) {
            continue;
        }
        let velocity_kmh = number(&r, velocity_idx);
        if !velocity_kmh.is_finite() {
            continue;
        }
        let available = number(&r, available_idx);
        rows.push(Row {
            velocity_kmh,
            required_n: number(&r, required_idx),
            available_n: available.is_finite().then_some(available),
            rpm: number(&r, rpm_idx),
            torque_nm: number(&r, torque_idx),
            no_load_speed_rev_s: number(&r, no_load_idx),
            stall_torque_nm: number(&r, stall_idx),
            max_torque_nm: number(&r, max_torque_idx),
            valid: r
                .get(valid_idx)
                .unwrap_or("false")
                .eq_ignore_ascii_case("true"),
        });
    }
    Ok((chosen.unwrap_or_default(), rows))
}
