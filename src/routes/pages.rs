use askama::Template;
use axum::{extract::State, response::Html};
use chrono_tz::Tz;

use crate::{
    coerce::number_to_text,
    controller::ViewerController,
    error::AppResult,
    format::{self, PLACEHOLDER},
    models::{Advert, Loose, SortDirection, SortKey},
    AppState,
};

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    username: String,
    error: String,
    in_flight: bool,
}

pub struct SelectOption {
    value: String,
    selected: bool,
}

pub struct ColumnHeader {
    key: &'static str,
    label: String, // includes the sort arrow on the active column
    numeric: bool,
}

pub struct AdvertRow {
    title: String,
    link: String,
    created: String,
    price: String,
    min_price: String,
    min_20: String,
    min_20_tip: String,
    min_25: String,
    min_25_tip: String,
    min_30: String,
    min_30_tip: String,
    max_price: String,
    diff: String,
    bargain: bool,
    brand: String,
    fuel_type: String,
    gearbox: String,
    year: String,
}

#[derive(Template)]
#[template(path = "adverts.html")]
struct AdvertsTemplate {
    brand_options: Vec<SelectOption>,
    fuel_options: Vec<SelectOption>,
    gearbox_options: Vec<SelectOption>,
    year_min: String,
    year_max: String,
    price_min: String,
    price_max: String,
    diff_max: String,
    text: String,
    only_missing: bool,
    headers: Vec<ColumnHeader>,
    rows: Vec<AdvertRow>,
    loading: bool,
    error: String,
    shown: usize,
    total: usize,
}

fn column_label(key: SortKey) -> &'static str {
    match key {
        SortKey::Title => "Title",
        SortKey::AdvertCreatedAt => "Created",
        SortKey::Price => "Price (€)",
        SortKey::MinPrice => "Min (€)",
        SortKey::MinPrice20Below => "Min 20% (€)",
        SortKey::MinPrice25Below => "Min 25% (€)",
        SortKey::MinPrice30Below => "Min 30% (€)",
        SortKey::MaxPrice => "Max (€)",
        SortKey::DiffPriceMinPrice => "Diff vs Min (€)",
        SortKey::Brand => "Brand",
        SortKey::FuelType => "Fuel",
        SortKey::Gearbox => "Gearbox",
        SortKey::Year => "Year",
    }
}

fn select_options(values: &[String], selected: &str) -> Vec<SelectOption> {
    values
        .iter()
        .map(|v| SelectOption { value: v.clone(), selected: v == selected })
        .collect()
}

// Year is shown as received
fn raw_value(value: Option<&Loose>) -> String {
    match value {
        Some(Loose::Number(n)) => number_to_text(*n),
        Some(Loose::Text(s)) => s.clone(),
        Some(Loose::Other(v)) => v.to_string(),
        None => PLACEHOLDER.to_string(),
    }
}

fn advert_row(advert: &Advert, tz: Tz) -> AdvertRow {
    let link = advert.tracking_url.clone().unwrap_or_default();
    let title = match advert.title.as_deref().filter(|t| !t.is_empty()) {
        Some(t) => t.to_string(),
        None if !link.is_empty() => "Open".to_string(),
        None => PLACEHOLDER.to_string(),
    };
    let min = advert.min_price.as_ref();
    AdvertRow {
        title,
        link,
        created: format::format_timestamp(advert.advert_created_at.as_deref(), tz),
        price: format::format_number(advert.price.as_ref()),
        min_price: format::format_number(min),
        min_20: format::format_number(advert.min_price_20_below.as_ref()),
        min_20_tip: format::diff_tooltip("Net", min, advert.min_price_20_below.as_ref()),
        min_25: format::format_number(advert.min_price_25_below.as_ref()),
        min_25_tip: format::diff_tooltip("Net", min, advert.min_price_25_below.as_ref()),
        min_30: format::format_number(advert.min_price_30_below.as_ref()),
        min_30_tip: format::diff_tooltip("Net", min, advert.min_price_30_below.as_ref()),
        max_price: format::format_number(advert.max_price.as_ref()),
        diff: format::format_number(advert.diff_price_min_price.as_ref()),
        bargain: format::is_bargain(advert.diff_price_min_price.as_ref()),
        brand: format::text_or_placeholder(advert.brand.as_deref()),
        fuel_type: format::text_or_placeholder(advert.fuel_type.as_deref()),
        gearbox: format::text_or_placeholder(advert.gearbox.as_deref()),
        year: raw_value(advert.year.as_ref()),
    }
}

fn adverts_page(viewer: &ViewerController, tz: Tz) -> AdvertsTemplate {
    let filters = viewer.filters();
    let options = viewer.options();
    let sort = viewer.sort();

    let headers = SortKey::ALL
        .into_iter()
        .map(|key| {
            let arrow = match (key == sort.key, sort.direction) {
                (false, _) => "",
                (true, SortDirection::Ascending) => " ▲",
                (true, SortDirection::Descending) => " ▼",
            };
            ColumnHeader {
                key: key.as_str(),
                label: format!("{}{}", column_label(key), arrow),
                numeric: key.is_numeric(),
            }
        })
        .collect();

    let rows: Vec<AdvertRow> = viewer.view().into_iter().map(|a| advert_row(a, tz)).collect();

    AdvertsTemplate {
        brand_options: select_options(&options.brands, &filters.brand),
        fuel_options: select_options(&options.fuel_types, &filters.fuel_type),
        gearbox_options: select_options(&options.gearboxes, &filters.gearbox),
        year_min: filters.year_min.clone(),
        year_max: filters.year_max.clone(),
        price_min: filters.price_min.clone(),
        price_max: filters.price_max.clone(),
        diff_max: filters.diff_max.clone(),
        text: filters.text.clone(),
        only_missing: filters.only_missing,
        headers,
        shown: rows.len(),
        rows,
        loading: viewer.is_loading(),
        error: viewer.error().unwrap_or_default().to_string(),
        total: viewer.dataset().len(),
    }
}

// Login view without a credential, data view with one
pub async fn index(State(app_state): State<AppState>) -> AppResult<Html<String>> {
    let mut viewer = app_state.viewer.lock().await;
    viewer.sync_session();

    let html = if viewer.is_authenticated() {
        adverts_page(&viewer, app_state.display_tz).render()?
    } else {
        let login = viewer.login_state();
        LoginTemplate {
            username: login.username.clone(),
            error: login.error.clone().unwrap_or_default(),
            in_flight: login.in_flight,
        }
        .render()?
    };
    Ok(Html(html))
}
