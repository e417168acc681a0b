//! Certificate and attendance-sheet templates.
//!
//! Five presentational certificate layouts plus an attendance sheet,
//! rendered to self-contained HTML with inline styles. Rendering is plain
//! string assembly; the markup then goes through the export pipeline like
//! any other markup region.
//!
//! User-supplied text is HTML-escaped on interpolation.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Data interpolated into a certificate layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificateData {
    pub recipient_name: String,
    pub training_title: String,
    pub organization: String,
    pub certificate_text: String,
    pub completion_date: String,
    pub certificate_id: String,
    pub trainer_name: String,
    pub validity_period: String,
    pub grade: String,
    pub hours: String,
    pub location: String,
    pub reference_number: String,
}

impl Default for CertificateData {
    fn default() -> Self {
        let now = Utc::now();
        let serial = now.timestamp_millis() % 1_000_000;
        Self {
            recipient_name: "John Doe".into(),
            training_title: "Safety Training Program".into(),
            organization: "Safety First Inc.".into(),
            certificate_text: "has successfully completed the training program and \
                               demonstrated proficiency in all required competencies."
                .into(),
            completion_date: now.format("%Y-%m-%d").to_string(),
            certificate_id: format!("CERT-{serial:06}"),
            trainer_name: "Sarah Johnson".into(),
            validity_period: "2 Years".into(),
            grade: "Excellent".into(),
            hours: "8".into(),
            location: "Online".into(),
            reference_number: format!("REF-{:08}", now.timestamp() % 100_000_000),
        }
    }
}

/// The available certificate layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateLayout {
    /// Modern gradient design with clean layout.
    #[default]
    Professional,
    /// Formal design for corporate training programs.
    Corporate,
    /// Classic design with decorative elements.
    Elegant,
    /// Simple and clean design.
    Minimal,
    /// Designed specifically for safety training.
    Safety,
}

impl CertificateLayout {
    pub fn all() -> [CertificateLayout; 5] {
        [
            CertificateLayout::Professional,
            CertificateLayout::Corporate,
            CertificateLayout::Elegant,
            CertificateLayout::Minimal,
            CertificateLayout::Safety,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CertificateLayout::Professional => "professional",
            CertificateLayout::Corporate => "corporate",
            CertificateLayout::Elegant => "elegant",
            CertificateLayout::Minimal => "minimal",
            CertificateLayout::Safety => "safety",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            CertificateLayout::Professional => "Modern gradient design with clean layout",
            CertificateLayout::Corporate => "Formal design for corporate training programs",
            CertificateLayout::Elegant => "Classic design with decorative elements",
            CertificateLayout::Minimal => "Simple and clean design",
            CertificateLayout::Safety => "Designed specifically for safety training",
        }
    }
}

/// One row of the attendance table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Participant {
    pub name: String,
    pub employee_id: String,
    pub department: String,
}

/// Data interpolated into the attendance sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttendanceSheetData {
    pub training_title: String,
    pub training_date: String,
    pub trainer_name: String,
    pub location: String,
    pub participants: Vec<Participant>,
}

impl Default for AttendanceSheetData {
    fn default() -> Self {
        Self {
            training_title: "Safety Training".into(),
            training_date: Utc::now().format("%Y-%m-%d").to_string(),
            trainer_name: "Trainer Name".into(),
            location: "Training Location".into(),
            participants: Vec::new(),
        }
    }
}

/// Render a certificate in the given layout.
pub fn render_certificate(layout: CertificateLayout, data: &CertificateData) -> String {
    match layout {
        CertificateLayout::Professional => render_professional(data),
        CertificateLayout::Corporate => render_corporate(data),
        CertificateLayout::Elegant => render_elegant(data),
        CertificateLayout::Minimal => render_minimal(data),
        CertificateLayout::Safety => render_safety(data),
    }
}

fn render_professional(d: &CertificateData) -> String {
    format!(
        r#"<div class="professional-certificate" style="font-family: 'Segoe UI', Tahoma, sans-serif; background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; padding: 40px; border: 20px solid #2c3e50;">
  <div style="text-align: center; margin-bottom: 40px;">
    <h1 style="font-size: 3rem; margin: 0; text-transform: uppercase; letter-spacing: 3px;">Certificate</h1>
    <p style="font-size: 1.2rem; opacity: 0.9;">of Achievement</p>
  </div>
  <div style="background: rgba(255,255,255,0.1); padding: 30px; border-radius: 10px; text-align: center;">
    <p>This certificate is proudly presented to</p>
    <h2 class="recipient-name" style="font-size: 2.5rem; margin: 20px 0; font-weight: bold;">{name}</h2>
    <h3 style="font-size: 1.8rem; color: #ffd700;">{title}</h3>
    <p style="font-size: 1.1rem; line-height: 1.6;">{text}</p>
    <div style="margin-top: 40px; display: flex; justify-content: space-around;">
      <span><strong>Completed:</strong> {date}</span>
      <span><strong>Certificate ID:</strong> {id}</span>
      <span><strong>Valid for:</strong> {validity}</span>
      <span><strong>Duration:</strong> {hours} hours</span>
    </div>
  </div>
  <div style="display: flex; justify-content: space-between; margin-top: 40px;">
    <p style="border-top: 2px solid rgba(255,255,255,0.5); padding-top: 10px;">{trainer}<br/>Lead Trainer</p>
    <p style="border-top: 2px solid rgba(255,255,255,0.5); padding-top: 10px;">{org}<br/>Issuing Organization</p>
  </div>
  <p style="margin-top: 30px; font-size: 0.8rem; text-align: center;">Verify this certificate at: <strong>verify.safetytraining.com/{id}</strong></p>
</div>"#,
        name = esc(&d.recipient_name),
        title = esc(&d.training_title),
        text = esc(&d.certificate_text),
        date = esc(&d.completion_date),
        id = esc(&d.certificate_id),
        validity = esc(&d.validity_period),
        hours = esc(&d.hours),
        trainer = esc(&d.trainer_name),
        org = esc(&d.organization),
    )
}

fn render_corporate(d: &CertificateData) -> String {
    format!(
        r#"<div class="corporate-certificate" style="font-family: Georgia, serif; background: #fff; color: #2c3e50; padding: 50px; border: 4px double #34495e;">
  <div style="text-align: center; border-bottom: 2px solid #34495e; padding-bottom: 20px;">
    <h2 style="margin: 0; letter-spacing: 2px;">{org}</h2>
    <p style="color: #7f8c8d;">Certificate of Training Completion</p>
  </div>
  <div style="text-align: center; margin: 40px 0;">
    <p>This is to certify that</p>
    <h2 class="recipient-name" style="font-size: 2.2rem; margin: 16px 0;">{name}</h2>
    <h3 style="font-weight: normal;">has completed the program<br/><strong>{title}</strong></h3>
    <p><strong>Program Code:</strong> {reference} &nbsp; <strong>Completion Date:</strong> {date} &nbsp; <strong>Certificate Number:</strong> {id}</p>
  </div>
  <table style="width: 100%; border-collapse: collapse; margin: 30px 0;">
    <tr>
      <td style="border: 1px solid #95a5a6; padding: 8px;"><strong>Grade</strong><br/>{grade}</td>
      <td style="border: 1px solid #95a5a6; padding: 8px;"><strong>Hours</strong><br/>{hours}</td>
      <td style="border: 1px solid #95a5a6; padding: 8px;"><strong>Location</strong><br/>{location}</td>
      <td style="border: 1px solid #95a5a6; padding: 8px;"><strong>Valid For</strong><br/>{validity}</td>
    </tr>
  </table>
  <p style="text-align: center;">{text}</p>
  <p style="text-align: center;">This certificate is issued under the authority of {org}.</p>
  <div style="display: flex; justify-content: space-between; margin-top: 50px;">
    <p style="border-top: 1px solid #2c3e50; padding-top: 8px;">{trainer}<br/>Authorized Signatory</p>
    <p style="border-top: 1px solid #2c3e50; padding-top: 8px;">{org}<br/>Training Department</p>
  </div>
</div>"#,
        org = esc(&d.organization),
        name = esc(&d.recipient_name),
        title = esc(&d.training_title),
        reference = esc(&d.reference_number),
        date = esc(&d.completion_date),
        id = esc(&d.certificate_id),
        grade = esc(&d.grade),
        hours = esc(&d.hours),
        location = esc(&d.location),
        validity = esc(&d.validity_period),
        text = esc(&d.certificate_text),
        trainer = esc(&d.trainer_name),
    )
}

fn render_elegant(d: &CertificateData) -> String {
    format!(
        r#"<div class="elegant-certificate" style="font-family: 'Times New Roman', serif; background: #fdfbf7; color: #4a235a; padding: 60px; border: 12px solid #8e44ad;">
  <div style="text-align: center;">
    <p style="letter-spacing: 6px; color: #9b59b6;">&#10022; &#10022; &#10022;</p>
    <h1 style="font-size: 2.8rem; margin: 10px 0; font-variant: small-caps;">Certificate of Accomplishment</h1>
  </div>
  <div style="text-align: center; margin: 40px 0;">
    <p style="font-style: italic;">Presented with honour to</p>
    <h2 class="recipient-name" style="font-size: 2.4rem; margin: 18px 0; border-bottom: 1px solid #8e44ad; display: inline-block; padding: 0 40px 8px;">{name}</h2>
    <h3 style="font-weight: normal; margin-top: 24px;">{title}</h3>
    <p style="max-width: 560px; margin: 0 auto; line-height: 1.7;">{text}</p>
  </div>
  <div style="display: flex; justify-content: center; gap: 60px; margin: 30px 0;">
    <span><em>Date of Completion</em><br/>{date}</span>
    <span><em>Certificate No.</em><br/>{id}</span>
    <span><em>Presented By</em><br/>{trainer}</span>
    <span><em>Institution</em><br/>{org}</span>
  </div>
  <p style="text-align: center; font-size: 0.85rem; color: #7d3c98; margin-top: 40px;">This certificate is registered in the official records of {org}</p>
</div>"#,
        name = esc(&d.recipient_name),
        title = esc(&d.training_title),
        text = esc(&d.certificate_text),
        date = esc(&d.completion_date),
        id = esc(&d.certificate_id),
        trainer = esc(&d.trainer_name),
        org = esc(&d.organization),
    )
}

fn render_minimal(d: &CertificateData) -> String {
    format!(
        r#"<div class="minimal-certificate" style="font-family: Helvetica, Arial, sans-serif; background: #fff; color: #2c3e50; padding: 60px; border: 1px solid #bdc3c7;">
  <h1 style="font-weight: 300; letter-spacing: 4px; margin: 0;">CERTIFICATE</h1>
  <div style="margin: 50px 0;">
    <p style="color: #7f8c8d;">Awarded to</p>
    <h2 class="recipient-name" style="font-size: 2rem; margin: 10px 0;">{name}</h2>
    <p style="color: #7f8c8d;">for completing</p>
    <h3 style="font-weight: 400;">{title}</h3>
    <p>on {date}</p>
  </div>
  <div style="display: flex; gap: 40px; font-size: 0.9rem;">
    <span>ID<br/><strong>{id}</strong></span>
    <span>Validity<br/><strong>{validity}</strong></span>
    <span>Hours<br/><strong>{hours}</strong></span>
    <span>Grade<br/><strong>{grade}</strong></span>
  </div>
  <div style="display: flex; justify-content: space-between; margin-top: 60px; font-size: 0.9rem;">
    <p style="border-top: 1px solid #2c3e50; padding-top: 6px;">{trainer}</p>
    <p style="border-top: 1px solid #2c3e50; padding-top: 6px;">{org}</p>
  </div>
  <p class="small" style="color: #95a5a6; font-size: 0.75rem; margin-top: 30px;">{id} &middot; {date}</p>
</div>"#,
        name = esc(&d.recipient_name),
        title = esc(&d.training_title),
        date = esc(&d.completion_date),
        id = esc(&d.certificate_id),
        validity = esc(&d.validity_period),
        hours = esc(&d.hours),
        grade = esc(&d.grade),
        trainer = esc(&d.trainer_name),
        org = esc(&d.organization),
    )
}

fn render_safety(d: &CertificateData) -> String {
    format!(
        r#"<div class="safety-certificate" style="font-family: Arial, sans-serif; background: #fff; color: #2c3e50; padding: 40px; border: 16px solid #e74c3c;">
  <div style="text-align: center; background: #e74c3c; color: white; padding: 16px; margin: -40px -40px 30px;">
    <h1 style="margin: 0; letter-spacing: 2px;">SAFETY TRAINING CERTIFICATE</h1>
  </div>
  <div style="text-align: center;">
    <p>This certifies that</p>
    <h2 class="recipient-name safety" style="font-size: 2.3rem; margin: 16px 0; color: #c0392b;">{name}</h2>
    <p>has successfully completed</p>
    <h3 style="color: #2c3e50;">{title}</h3>
    <p style="max-width: 560px; margin: 0 auto; line-height: 1.6;">{text}</p>
  </div>
  <div style="display: flex; justify-content: space-around; margin: 30px 0; background: rgba(52, 152, 219, 0.08); padding: 16px;">
    <span><strong>Completed</strong><br/>{date}</span>
    <span><strong>Certificate</strong><br/>{id}</span>
    <span><strong>Valid For</strong><br/>{validity}</span>
    <span><strong>Trainer</strong><br/>{trainer}</span>
  </div>
  <div style="display: flex; justify-content: space-between; align-items: center;">
    <p>{org}<br/><em>Commitment to Workplace Safety</em></p>
    <div style="border: 2px solid #2ecc71; color: #2ecc71; padding: 8px 14px; font-weight: bold;">COMPLIANCE<br/>VERIFIED</div>
  </div>
  <p style="font-size: 0.7rem; color: #7f8c8d; margin-top: 20px;"><small>This certificate does not guarantee workplace safety. All personnel must continue to follow established safety protocols and procedures.</small></p>
</div>"#,
        name = esc(&d.recipient_name),
        title = esc(&d.training_title),
        text = esc(&d.certificate_text),
        date = esc(&d.completion_date),
        id = esc(&d.certificate_id),
        validity = esc(&d.validity_period),
        trainer = esc(&d.trainer_name),
        org = esc(&d.organization),
    )
}

/// Render the attendance sheet with one table row per participant.
pub fn render_attendance_sheet(data: &AttendanceSheetData) -> String {
    let mut rows = String::new();
    for (i, p) in data.participants.iter().enumerate() {
        rows.push_str(&format!(
            r#"<tr>
  <td style="border: 1px solid #ddd; padding: 10px;">{}</td>
  <td style="border: 1px solid #ddd; padding: 10px;">{}</td>
  <td style="border: 1px solid #ddd; padding: 10px;">{}</td>
  <td style="border: 1px solid #ddd; padding: 10px;">{}</td>
  <td style="border: 1px solid #ddd; padding: 10px; height: 40px;">________________</td>
</tr>
"#,
            i + 1,
            esc(&p.name),
            esc(&p.employee_id),
            esc(&p.department),
        ));
    }

    format!(
        r#"<div class="attendance-sheet" style="font-family: Arial, sans-serif; padding: 20mm;">
  <h1 style="text-align: center; color: #2c3e50; margin-bottom: 30px;">ATTENDANCE SHEET</h1>
  <div style="margin-bottom: 30px;">
    <p><strong>Training Title:</strong> {title}</p>
    <p><strong>Date:</strong> {date}</p>
    <p><strong>Trainer:</strong> {trainer}</p>
    <p><strong>Location:</strong> {location}</p>
  </div>
  <table style="width: 100%; border-collapse: collapse; margin-top: 20px;">
    <thead>
      <tr style="background: #3498db; color: white;">
        <th style="border: 1px solid #ddd; padding: 10px;">Sr. No.</th>
        <th style="border: 1px solid #ddd; padding: 10px;">Participant Name</th>
        <th style="border: 1px solid #ddd; padding: 10px;">Employee ID</th>
        <th style="border: 1px solid #ddd; padding: 10px;">Department</th>
        <th style="border: 1px solid #ddd; padding: 10px;">Signature</th>
      </tr>
    </thead>
    <tbody>
{rows}    </tbody>
  </table>
  <div style="margin-top: 50px; display: flex; justify-content: space-between;">
    <p>________________________<br/><strong>Trainer's Signature</strong></p>
    <p style="text-align: right;">________________________<br/><strong>Date</strong></p>
  </div>
</div>"#,
        title = esc(&data.training_title),
        date = esc(&data.training_date),
        trainer = esc(&data.trainer_name),
        location = esc(&data.location),
        rows = rows,
    )
}

fn esc(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
