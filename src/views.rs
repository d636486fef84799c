// src/views.rs
//
// Server-rendered GOV.UK Design System markup, assembled with plain string
// templates. Behaviour lives in the handlers/services; these functions only
// turn already-resolved data into HTML.

use crate::models::crm::{DocumentHeader, PermitLicence};
use crate::models::session::Session;
use crate::services::status_service::ServiceStatus;

/// Minimal HTML escaping for text interpolated into markup.
pub fn escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn nav(session: Option<&Session>) -> String {
    match session {
        Some(s) if s.is_internal() => r#"<nav class="govuk-header__navigation">
      <a class="govuk-header__link" href="/admin/licences">Licences</a>
      <a class="govuk-header__link" href="/service-status">Service status</a>
      <a class="govuk-header__link" href="/signout">Sign out</a>
    </nav>"#
            .to_string(),
        Some(_) => r#"<nav class="govuk-header__navigation">
      <a class="govuk-header__link" href="/licences">View licences</a>
      <a class="govuk-header__link" href="/manage_licences">Manage licences</a>
      <a class="govuk-header__link" href="/signout">Sign out</a>
    </nav>"#
            .to_string(),
        None => r#"<nav class="govuk-header__navigation">
      <a class="govuk-header__link" href="/signin">Sign in</a>
      <a class="govuk-header__link" href="/register">Register</a>
    </nav>"#
            .to_string(),
    }
}

pub fn layout(title: &str, body: &str, session: Option<&Session>) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en" class="govuk-template">
<head>
  <meta charset="utf-8">
  <title>{title} - Manage your water abstraction or impoundment licence - GOV.UK</title>
</head>
<body class="govuk-template__body">
  <header class="govuk-header" role="banner">
    <div class="govuk-header__container govuk-width-container">
      <span class="govuk-header__logotype-text">GOV.UK</span>
      <span class="govuk-header__service-name">Manage your water abstraction or impoundment licence</span>
      {nav}
    </div>
  </header>
  <div class="govuk-width-container">
    <main class="govuk-main-wrapper" id="main-content" role="main">
{body}
    </main>
  </div>
</body>
</html>"#,
        title = escape(title),
        nav = nav(session),
        body = body,
    )
}

/// GOV.UK error summary: anchor links to the fields in error.
pub fn error_summary(errors: &[(&str, &str)]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let items: String = errors
        .iter()
        .map(|(field, message)| {
            format!(
                r##"<li><a href="#{field}">{message}</a></li>"##,
                field = escape(field),
                message = escape(message)
            )
        })
        .collect();
    format!(
        r#"<div class="govuk-error-summary" role="alert" data-module="govuk-error-summary">
  <h2 class="govuk-error-summary__title">There is a problem</h2>
  <div class="govuk-error-summary__body"><ul class="govuk-list govuk-error-summary__list">{items}</ul></div>
</div>"#
    )
}

fn csrf_field(session: &Session) -> String {
    format!(
        r#"<input type="hidden" name="csrf_token" value="{}">"#,
        session.csrf_token
    )
}

// --- Sign in / sign out --------------------------------------------------

// The password field is never echoed back on re-render.
pub fn signin_page(errors: &[(&str, &str)], email_value: &str) -> String {
    let body = format!(
        r#"{summary}
<h1 class="govuk-heading-l">Sign in</h1>
<form method="post" action="/signin" novalidate>
  <div class="govuk-form-group">
    <label class="govuk-label" for="email">Email address</label>
    <input class="govuk-input" id="email" name="email" type="email" value="{email}">
  </div>
  <div class="govuk-form-group">
    <label class="govuk-label" for="password">Password</label>
    <input class="govuk-input" id="password" name="password" type="password" value="">
  </div>
  <button class="govuk-button" type="submit">Sign in</button>
</form>
<p class="govuk-body"><a class="govuk-link" href="/reset_password">Forgotten your password?</a></p>"#,
        summary = error_summary(errors),
        email = escape(email_value),
    );
    layout("Sign in", &body, None)
}

pub fn signed_out_page() -> String {
    let body = r#"<h1 class="govuk-heading-l">You are signed out</h1>
<p class="govuk-body"><a class="govuk-link" href="/signin">Sign in again</a></p>"#;
    layout("Signed out", body, None)
}

// --- Registration --------------------------------------------------------

pub fn register_page(errors: &[(&str, &str)], email_value: &str) -> String {
    let body = format!(
        r#"{summary}
<h1 class="govuk-heading-l">Create an account</h1>
<form method="post" action="/register" novalidate>
  <div class="govuk-form-group">
    <label class="govuk-label" for="email">Email address</label>
    <input class="govuk-input" id="email" name="email" type="email" value="{email}">
  </div>
  <button class="govuk-button" type="submit">Continue</button>
</form>"#,
        summary = error_summary(errors),
        email = escape(email_value),
    );
    layout("Create an account", &body, None)
}

pub fn register_success_page() -> String {
    let body = r#"<div class="govuk-panel govuk-panel--confirmation">
  <h1 class="govuk-panel__title">Confirm your email address</h1>
</div>
<p class="govuk-body">We have sent you an email. Follow the link in it to set your password.</p>
<p class="govuk-body"><a class="govuk-link" href="/send-again">Not received an email?</a></p>"#;
    layout("Check your email", body, None)
}

pub fn send_again_page(errors: &[(&str, &str)], email_value: &str) -> String {
    let body = format!(
        r#"{summary}
<h1 class="govuk-heading-l">Ask for another email</h1>
<form method="post" action="/send-again" novalidate>
  <div class="govuk-form-group">
    <label class="govuk-label" for="email">Email address</label>
    <input class="govuk-input" id="email" name="email" type="email" value="{email}">
  </div>
  <button class="govuk-button" type="submit">Send</button>
</form>"#,
        summary = error_summary(errors),
        email = escape(email_value),
    );
    layout("Ask for another email", &body, None)
}

// --- Password reset ------------------------------------------------------

pub fn reset_request_page(errors: &[(&str, &str)], email_value: &str) -> String {
    let body = format!(
        r#"{summary}
<h1 class="govuk-heading-l">Reset your password</h1>
<form method="post" action="/reset_password" novalidate>
  <div class="govuk-form-group">
    <label class="govuk-label" for="email">Email address</label>
    <input class="govuk-input" id="email" name="email" type="email" value="{email}">
  </div>
  <button class="govuk-button" type="submit">Continue</button>
</form>"#,
        summary = error_summary(errors),
        email = escape(email_value),
    );
    layout("Reset your password", &body, None)
}

pub fn reset_check_email_page() -> String {
    let body = r#"<h1 class="govuk-heading-l">Check your email</h1>
<p class="govuk-body">If that email address is registered, we have sent a link to reset your password.</p>"#;
    layout("Check your email", body, None)
}

pub fn change_password_page(reset_guid: &str, errors: &[(&str, &str)], forced: bool) -> String {
    let hint = if forced {
        r#"<p class="govuk-body">You need to change your password before you can sign in.</p>"#
    } else {
        ""
    };
    let body = format!(
        r#"{summary}
<h1 class="govuk-heading-l">Change your password</h1>
{hint}
<form method="post" action="/reset_password_change_password" novalidate>
  <input type="hidden" name="reset_guid" value="{guid}">
  <div class="govuk-form-group">
    <label class="govuk-label" for="password">New password</label>
    <input class="govuk-input" id="password" name="password" type="password" value="">
  </div>
  <div class="govuk-form-group">
    <label class="govuk-label" for="confirm_password">Confirm your password</label>
    <input class="govuk-input" id="confirm_password" name="confirm_password" type="password" value="">
  </div>
  <button class="govuk-button" type="submit">Change password</button>
</form>"#,
        summary = error_summary(errors),
        hint = hint,
        guid = escape(reset_guid),
    );
    layout("Change your password", &body, None)
}

// --- Licences ------------------------------------------------------------

fn licence_rows(documents: &[DocumentHeader]) -> String {
    documents
        .iter()
        .map(|doc| {
            format!(
                r#"<tr class="govuk-table__row">
  <td class="govuk-table__cell"><a class="govuk-link" href="/licences/{id}">{name}</a></td>
  <td class="govuk-table__cell">{number}</td>
</tr>"#,
                id = doc.document_id,
                name = escape(doc.display_name()),
                number = escape(&doc.system_external_id),
            )
        })
        .collect()
}

pub fn licences_page(session: &Session, documents: &[DocumentHeader]) -> String {
    let body = format!(
        r#"<h1 class="govuk-heading-l">Your licences</h1>
<table class="govuk-table">
  <thead class="govuk-table__head">
    <tr class="govuk-table__row">
      <th scope="col" class="govuk-table__header">Licence</th>
      <th scope="col" class="govuk-table__header">Licence number</th>
    </tr>
  </thead>
  <tbody class="govuk-table__body">{rows}</tbody>
</table>"#,
        rows = licence_rows(documents),
    );
    layout("Your licences", &body, Some(session))
}

pub fn licence_detail_page(
    session: &Session,
    document: &DocumentHeader,
    permit: &PermitLicence,
) -> String {
    let body = format!(
        r#"<h1 class="govuk-heading-l">{name}</h1>
<p class="govuk-body">Licence number {number}</p>
<p class="govuk-body">Registered to {holder}</p>
<p class="govuk-body"><a class="govuk-link" href="/licences/{id}/rename">Rename this licence</a></p>
<pre class="govuk-body">{data}</pre>"#,
        name = escape(document.display_name()),
        number = escape(&document.system_external_id),
        holder = escape(&document.metadata.holder_name),
        id = document.document_id,
        data = escape(&permit.licence_data.to_string()),
    );
    layout(document.display_name(), &body, Some(session))
}

pub fn rename_page(
    session: &Session,
    document: &DocumentHeader,
    errors: &[(&str, &str)],
) -> String {
    let body = format!(
        r#"{summary}
<h1 class="govuk-heading-l">Rename licence {number}</h1>
<form method="post" action="/licences/{id}/rename" novalidate>
  {csrf}
  <div class="govuk-form-group">
    <label class="govuk-label" for="name">Licence name</label>
    <input class="govuk-input" id="name" name="name" type="text" value="{current}">
  </div>
  <button class="govuk-button" type="submit">Save</button>
</form>"#,
        summary = error_summary(errors),
        number = escape(&document.system_external_id),
        id = document.document_id,
        csrf = csrf_field(session),
        current = escape(document.document_name.as_deref().unwrap_or("")),
    );
    layout("Rename licence", &body, Some(session))
}

pub fn admin_licences_page(session: &Session, documents: &[DocumentHeader]) -> String {
    let body = format!(
        r#"<h1 class="govuk-heading-l">Licences</h1>
<table class="govuk-table">
  <tbody class="govuk-table__body">{rows}</tbody>
</table>"#,
        rows = licence_rows(documents),
    );
    layout("Licences", &body, Some(session))
}

// --- Licence sharing / verification --------------------------------------

pub fn manage_licences_page(session: &Session, documents: &[DocumentHeader]) -> String {
    let rows: String = documents
        .iter()
        .map(|doc| {
            let status = if doc.verified {
                "Verified"
            } else {
                "Verification pending"
            };
            format!(
                r#"<tr class="govuk-table__row">
  <td class="govuk-table__cell">{number}</td>
  <td class="govuk-table__cell">{status}</td>
</tr>"#,
                number = escape(&doc.system_external_id),
            )
        })
        .collect();
    let body = format!(
        r#"<h1 class="govuk-heading-l">Manage your licences</h1>
<p class="govuk-body"><a class="govuk-link govuk-button" href="/add-licences">Add licences</a></p>
<p class="govuk-body"><a class="govuk-link" href="/manage_licences/access">Give access to your licences</a></p>
<table class="govuk-table"><tbody class="govuk-table__body">{rows}</tbody></table>"#,
    );
    layout("Manage your licences", &body, Some(session))
}

pub fn add_licences_page(session: &Session, errors: &[(&str, &str)], value: &str) -> String {
    let body = format!(
        r#"{summary}
<h1 class="govuk-heading-l">Add your licences to the service</h1>
<form method="post" action="/add-licences" novalidate>
  {csrf}
  <div class="govuk-form-group">
    <label class="govuk-label" for="licence_numbers">Enter your licence numbers</label>
    <div class="govuk-hint">You can separate licence numbers with commas or spaces.</div>
    <textarea class="govuk-textarea" id="licence_numbers" name="licence_numbers">{value}</textarea>
  </div>
  <button class="govuk-button" type="submit">Continue</button>
</form>"#,
        summary = error_summary(errors),
        csrf = csrf_field(session),
        value = escape(value),
    );
    layout("Add your licences", &body, Some(session))
}

pub fn select_licences_page(
    session: &Session,
    candidates: &[DocumentHeader],
    errors: &[(&str, &str)],
) -> String {
    let boxes: String = candidates
        .iter()
        .map(|doc| {
            format!(
                r#"<div class="govuk-checkboxes__item">
  <input class="govuk-checkboxes__input" id="doc-{id}" name="documents" type="checkbox" value="{id}" checked>
  <label class="govuk-label govuk-checkboxes__label" for="doc-{id}">{number} ({holder})</label>
</div>"#,
                id = doc.document_id,
                number = escape(&doc.system_external_id),
                holder = escape(&doc.metadata.holder_name),
            )
        })
        .collect();
    let body = format!(
        r#"{summary}
<h1 class="govuk-heading-l">Select the licences to add</h1>
<form method="post" action="/select-licences" novalidate>
  {csrf}
  <div class="govuk-checkboxes" id="documents">{boxes}</div>
  <button class="govuk-button" type="submit">Continue</button>
</form>"#,
        summary = error_summary(errors),
        csrf = csrf_field(session),
    );
    layout("Select licences", &body, Some(session))
}

pub fn select_address_page(
    session: &Session,
    candidates: &[DocumentHeader],
    errors: &[(&str, &str)],
) -> String {
    let radios: String = candidates
        .iter()
        .map(|doc| {
            format!(
                r#"<div class="govuk-radios__item">
  <input class="govuk-radios__input" id="addr-{id}" name="document_id" type="radio" value="{id}">
  <label class="govuk-label govuk-radios__label" for="addr-{id}">{address}</label>
</div>"#,
                id = doc.document_id,
                address = escape(&doc.metadata.address.join(", ")),
            )
        })
        .collect();
    let body = format!(
        r#"{summary}
<h1 class="govuk-heading-l">Where should we send your security code?</h1>
<form method="post" action="/select-address" novalidate>
  {csrf}
  <div class="govuk-radios" id="document_id">{radios}</div>
  <button class="govuk-button" type="submit">Continue</button>
</form>"#,
        summary = error_summary(errors),
        csrf = csrf_field(session),
    );
    layout("Select an address", &body, Some(session))
}

pub fn security_code_page(session: &Session, errors: &[(&str, &str)]) -> String {
    let body = format!(
        r#"{summary}
<h1 class="govuk-heading-l">Enter your security code</h1>
<p class="govuk-body">We have posted a security code to the licence address.</p>
<form method="post" action="/security-code" novalidate>
  {csrf}
  <div class="govuk-form-group">
    <label class="govuk-label" for="verification_code">Security code</label>
    <input class="govuk-input govuk-input--width-10" id="verification_code" name="verification_code" type="text" value="">
  </div>
  <button class="govuk-button" type="submit">Continue</button>
</form>"#,
        summary = error_summary(errors),
        csrf = csrf_field(session),
    );
    layout("Enter your security code", &body, Some(session))
}

pub fn verification_sent_page(session: &Session) -> String {
    let body = r#"<div class="govuk-panel govuk-panel--confirmation">
  <h1 class="govuk-panel__title">We are sending you a letter</h1>
</div>
<p class="govuk-body">Your security code will arrive in the post. <a class="govuk-link" href="/security-code">Enter it here</a> when it does.</p>"#;
    layout("Letter on its way", body, Some(session))
}

pub fn licences_added_page(session: &Session) -> String {
    let body = r#"<div class="govuk-panel govuk-panel--confirmation">
  <h1 class="govuk-panel__title">Licences added</h1>
</div>
<p class="govuk-body"><a class="govuk-link" href="/licences">View your licences</a></p>"#;
    layout("Licences added", body, Some(session))
}

pub fn access_page(session: &Session, errors: &[(&str, &str)], email_value: &str) -> String {
    let body = format!(
        r#"{summary}
<h1 class="govuk-heading-l">Give access to your licences</h1>
<form method="post" action="/manage_licences/access" novalidate>
  {csrf}
  <div class="govuk-form-group">
    <label class="govuk-label" for="email">Email address</label>
    <input class="govuk-input" id="email" name="email" type="email" value="{email}">
  </div>
  <div class="govuk-checkboxes">
    <div class="govuk-checkboxes__item">
      <input class="govuk-checkboxes__input" id="returns" name="returns" type="checkbox" value="true">
      <label class="govuk-label govuk-checkboxes__label" for="returns">Allow returns submission</label>
    </div>
  </div>
  <button class="govuk-button" type="submit">Give access</button>
</form>"#,
        summary = error_summary(errors),
        csrf = csrf_field(session),
        email = escape(email_value),
    );
    layout("Give access", &body, Some(session))
}

pub fn access_granted_page(session: &Session, email: &str) -> String {
    let body = format!(
        r#"<div class="govuk-panel govuk-panel--confirmation">
  <h1 class="govuk-panel__title">Access given</h1>
</div>
<p class="govuk-body">{email} can now view your licences.</p>"#,
        email = escape(email),
    );
    layout("Access given", &body, Some(session))
}

// --- Service status ------------------------------------------------------

pub fn service_status_page(status: &ServiceStatus) -> String {
    fn row(name: &str, counts: &Option<std::collections::BTreeMap<String, i64>>) -> String {
        let value = match counts {
            Some(map) => map
                .iter()
                .map(|(k, v)| format!("{}: {}", escape(k), v))
                .collect::<Vec<_>>()
                .join(", "),
            None => "-".to_string(),
        };
        format!(
            r#"<tr class="govuk-table__row">
  <td class="govuk-table__cell">{name}</td>
  <td class="govuk-table__cell">{value}</td>
</tr>"#,
        )
    }
    let body = format!(
        r#"<h1 class="govuk-heading-l">Service status</h1>
<table class="govuk-table"><tbody class="govuk-table__body">
{idm}{crm}{permit}{water}
</tbody></table>"#,
        idm = row("IDM", &status.idm),
        crm = row("CRM", &status.crm),
        permit = row("Permit repository", &status.permit),
        water = row("Water service", &status.water),
    );
    layout("Service status", &body, None)
}

// --- Error pages ---------------------------------------------------------

pub fn not_found_page() -> String {
    let body = r#"<h1 class="govuk-heading-l">Page not found</h1>
<p class="govuk-body">If you typed the web address, check it is correct.</p>"#;
    layout("Page not found", body, None)
}

pub fn error_page(title: &str, message: &str) -> String {
    let body = format!(
        r#"<h1 class="govuk-heading-l">{title}</h1>
<p class="govuk-body">{message}</p>"#,
        title = escape(title),
        message = escape(message),
    );
    layout(title, &body, None)
}
