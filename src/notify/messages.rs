use askama::Template;

use super::NotifyError;

/// Subject and HTML body of a notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub subject: String,
    pub body_html: String,
}

#[derive(Template)]
#[template(path = "notify/booking_confirmed.html")]
struct BookingConfirmedTemplate<'a> {
    member_name: &'a str,
    role: &'a str,
    meeting_date: &'a str,
}

#[derive(Template)]
#[template(path = "notify/booking_report.html")]
struct BookingReportTemplate<'a> {
    member_name: &'a str,
    role: &'a str,
    meeting_date: &'a str,
}

#[derive(Template)]
#[template(path = "notify/booking_cancelled.html")]
struct BookingCancelledTemplate<'a> {
    member_name: &'a str,
    role: &'a str,
    meeting_date: &'a str,
    by_admin: bool,
}

fn render(template: &impl Template) -> Result<String, NotifyError> {
    template
        .render()
        .map_err(|e| NotifyError::Render(e.to_string()))
}

pub fn booking_confirmed(
    member_name: &str,
    role: &str,
    meeting_date: &str,
) -> Result<Message, NotifyError> {
    Ok(Message {
        subject: format!("Confirmed: You are the {role}"),
        body_html: render(&BookingConfirmedTemplate {
            member_name,
            role,
            meeting_date,
        })?,
    })
}

/// Notice to the administrator that a member booked a role.
pub fn booking_report(
    member_name: &str,
    role: &str,
    meeting_date: &str,
) -> Result<Message, NotifyError> {
    Ok(Message {
        subject: format!("Booked: {role} on {meeting_date}"),
        body_html: render(&BookingReportTemplate {
            member_name,
            role,
            meeting_date,
        })?,
    })
}

pub fn booking_cancelled(
    member_name: &str,
    role: &str,
    meeting_date: &str,
    by_admin: bool,
) -> Result<Message, NotifyError> {
    Ok(Message {
        subject: format!("Cancelled: {role} Role"),
        body_html: render(&BookingCancelledTemplate {
            member_name,
            role,
            meeting_date,
            by_admin,
        })?,
    })
}
