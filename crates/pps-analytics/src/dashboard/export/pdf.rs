use super::{DashboardSnapshot, ExportArtifact, ExportError, PatientRow, SnapshotRenderer};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Rgb,
};

const PAGE_WIDTH_MM: f32 = 297.0;
const PAGE_HEIGHT_MM: f32 = 210.0;
const MARGIN_MM: f32 = 14.0;
const ROW_STEP_MM: f32 = 4.5;

const TABLE_COLUMNS: [(&str, f32); 7] = [
    ("Code", MARGIN_MM),
    ("Region", 44.0),
    ("District", 84.0),
    ("Facility", 124.0),
    ("Ward", 184.0),
    ("On Abx", 224.0),
    ("Survey Date", 248.0),
];

/// Full dashboard report on landscape A4: header, active filters, headline
/// statistics, then the patient table at 20 rows per page up to the page
/// cap, with a "more" trailer for anything beyond it.
#[derive(Debug, Clone, Copy)]
pub struct PdfRenderer {
    rows_per_page: usize,
    max_pages: usize,
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self {
            rows_per_page: 20,
            max_pages: 5,
        }
    }
}

struct ReportFonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl PdfRenderer {
    fn rule(layer: &PdfLayerReference, y: f32) {
        let line = Line {
            points: vec![
                (Point::new(Mm(MARGIN_MM.into()), Mm(y.into())), false),
                (
                    Point::new(Mm((PAGE_WIDTH_MM - MARGIN_MM).into()), Mm(y.into())),
                    false,
                ),
            ],
            is_closed: false,
        };
        layer.set_outline_color(Color::Rgb(Rgb::new(0.3, 0.3, 0.3, None)));
        layer.set_outline_thickness(0.4);
        layer.add_line(line);
    }

    fn text(layer: &PdfLayerReference, font: &IndirectFontRef, size: f32, x: f32, y: f32, text: &str) {
        layer.use_text(text, size.into(), Mm(x.into()), Mm(y.into()), font);
    }

    fn filter_summary(snapshot: &DashboardSnapshot) -> String {
        let active = snapshot.filters.active_fields();
        if active.is_empty() {
            return "Filters: none (all records)".to_string();
        }
        let parts: Vec<String> = active
            .iter()
            .map(|(field, value)| format!("{field}: {value}"))
            .collect();
        format!("Filters: {}", parts.join("; "))
    }

    /// Title block, filter line and headline metrics. Returns the y position
    /// where the table may start.
    fn draw_report_header(
        layer: &PdfLayerReference,
        fonts: &ReportFonts,
        snapshot: &DashboardSnapshot,
    ) -> f32 {
        let mut y = PAGE_HEIGHT_MM - MARGIN_MM;
        Self::text(
            layer,
            &fonts.bold,
            16.0,
            MARGIN_MM,
            y,
            "Point Prevalence Survey Dashboard Report",
        );
        y -= 6.0;
        Self::text(
            layer,
            &fonts.regular,
            9.0,
            MARGIN_MM,
            y,
            &format!("Generated {}", snapshot.report_date.format("%Y-%m-%d")),
        );
        y -= 4.0;
        Self::rule(layer, y);
        y -= 6.0;

        Self::text(layer, &fonts.regular, 9.0, MARGIN_MM, y, &Self::filter_summary(snapshot));
        y -= 7.0;

        let stats = &snapshot.stats;
        let prevalence = if stats.total_patients > 0 {
            stats.patients_on_antibiotic as f64 / stats.total_patients as f64 * 100.0
        } else {
            0.0
        };
        Self::text(
            layer,
            &fonts.bold,
            11.0,
            MARGIN_MM,
            y,
            &format!(
                "Patients: {}    On antibiotics: {} ({:.1}%)    Regions: {}    Facilities: {}    Wards: {}",
                stats.total_patients,
                stats.patients_on_antibiotic,
                prevalence,
                stats.by_region.len(),
                stats.by_facility.len(),
                stats.by_ward.len(),
            ),
        );
        y -= 5.0;
        Self::rule(layer, y);
        y - 7.0
    }

    fn draw_continuation_header(layer: &PdfLayerReference, fonts: &ReportFonts) -> f32 {
        let mut y = PAGE_HEIGHT_MM - MARGIN_MM;
        Self::text(
            layer,
            &fonts.regular,
            9.0,
            MARGIN_MM,
            y,
            "Point Prevalence Survey Dashboard Report (continued)",
        );
        y -= 4.0;
        Self::rule(layer, y);
        y - 7.0
    }

    fn draw_table_header(layer: &PdfLayerReference, fonts: &ReportFonts, mut y: f32) -> f32 {
        for (title, x) in TABLE_COLUMNS {
            Self::text(layer, &fonts.bold, 9.0, x, y, title);
        }
        y -= 2.0;
        Self::rule(layer, y);
        y - 5.0
    }

    fn draw_row(layer: &PdfLayerReference, fonts: &ReportFonts, y: f32, row: &PatientRow) {
        let survey_date = row
            .survey_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let cells: [&str; 7] = [
            &row.patient_code,
            &row.region,
            &row.district,
            &row.facility,
            &row.ward_name,
            &row.on_antibiotic,
            &survey_date,
        ];
        for (value, (_, x)) in cells.into_iter().zip(TABLE_COLUMNS) {
            Self::text(layer, &fonts.regular, 8.0, x, y, value);
        }
    }

    fn draw_footer(layer: &PdfLayerReference, fonts: &ReportFonts, page: usize, pages: usize) {
        Self::text(
            layer,
            &fonts.regular,
            8.0,
            MARGIN_MM,
            8.0,
            &format!("Page {page} of {pages} | Point Prevalence Survey System"),
        );
    }
}

impl SnapshotRenderer for PdfRenderer {
    fn render(&self, snapshot: &DashboardSnapshot) -> Result<ExportArtifact, ExportError> {
        if snapshot.patients.is_empty() {
            return Err(ExportError::Empty);
        }

        let shown = snapshot
            .patients
            .len()
            .min(self.rows_per_page * self.max_pages);
        let remaining = snapshot.patients.len() - shown;
        let pages = shown.div_ceil(self.rows_per_page);

        let (doc, first_page, first_layer) = PdfDocument::new(
            "PPS Dashboard Report",
            Mm(PAGE_WIDTH_MM.into()),
            Mm(PAGE_HEIGHT_MM.into()),
            "Layer 1",
        );
        let fonts = ReportFonts {
            regular: doc
                .add_builtin_font(BuiltinFont::Helvetica)
                .map_err(|e| ExportError::Pdf(e.to_string()))?,
            bold: doc
                .add_builtin_font(BuiltinFont::HelveticaBold)
                .map_err(|e| ExportError::Pdf(e.to_string()))?,
        };

        for (index, chunk) in snapshot.patients[..shown]
            .chunks(self.rows_per_page)
            .enumerate()
        {
            let layer = if index == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (page, layer) = doc.add_page(
                    Mm(PAGE_WIDTH_MM.into()),
                    Mm(PAGE_HEIGHT_MM.into()),
                    "Layer 1",
                );
                doc.get_page(page).get_layer(layer)
            };

            let table_top = if index == 0 {
                Self::draw_report_header(&layer, &fonts, snapshot)
            } else {
                Self::draw_continuation_header(&layer, &fonts)
            };

            let mut y = Self::draw_table_header(&layer, &fonts, table_top);
            for row in chunk {
                Self::draw_row(&layer, &fonts, y, row);
                y -= ROW_STEP_MM;
            }

            let is_last = index + 1 == pages;
            if is_last && remaining > 0 {
                Self::text(
                    &layer,
                    &fonts.regular,
                    8.0,
                    MARGIN_MM,
                    y,
                    &format!("... and {remaining} more"),
                );
            }

            Self::draw_footer(&layer, &fonts, index + 1, pages);
        }

        let bytes = doc
            .save_to_bytes()
            .map_err(|e| ExportError::Pdf(e.to_string()))?;
        Ok(ExportArtifact {
            filename: snapshot.filename("Dashboard_Report", "pdf"),
            content_type: "application/pdf",
            bytes,
        })
    }
}

/// Degraded text-only report used when the full render fails or times out.
/// Statistics only, no patient table, so it cannot hit the same failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimplePdfRenderer;

impl SnapshotRenderer for SimplePdfRenderer {
    fn render(&self, snapshot: &DashboardSnapshot) -> Result<ExportArtifact, ExportError> {
        let (doc, page, layer) = PdfDocument::new("PPS Summary Report", Mm(210.0), Mm(297.0), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ExportError::Pdf(e.to_string()))?;
        let layer = doc.get_page(page).get_layer(layer);

        let stats = &snapshot.stats;
        let lines = [
            "Point Prevalence Survey Summary Report".to_string(),
            format!("Generated {}", snapshot.report_date.format("%Y-%m-%d")),
            String::new(),
            format!("Total patients: {}", stats.total_patients),
            format!("Patients on antibiotics: {}", stats.patients_on_antibiotic),
            format!("Regions represented: {}", stats.by_region.len()),
            format!("Facilities represented: {}", stats.by_facility.len()),
            format!("Wards represented: {}", stats.by_ward.len()),
        ];

        let mut y = 280.0_f32;
        for line in lines {
            if !line.is_empty() {
                layer.use_text(line, 11.0, Mm(20.0), Mm(y.into()), &font);
            }
            y -= 7.0;
        }

        let bytes = doc
            .save_to_bytes()
            .map_err(|e| ExportError::Pdf(e.to_string()))?;
        Ok(ExportArtifact {
            filename: snapshot.filename("Summary_Report", "pdf"),
            content_type: "application/pdf",
            bytes,
        })
    }
}
