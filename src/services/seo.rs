// src/services/seo.rs
//
// Static documents served to the three PWA shells and to crawlers.

use askama::Template;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::{
    config::PwaSettings,
    models::pwa::{AppType, ChangeFreq, Manifest, ServiceWorkerConfig, SitemapEntry, SitemapEntryPayload},
};

pub fn manifest(app: AppType, pwa: &PwaSettings) -> Manifest {
    let (name, short_name) = match app {
        AppType::Vendor => ("Dodo Services - Vendor Portal".to_string(), "Dodo Vendor".to_string()),
        AppType::Admin => ("Dodo Services - Admin Panel".to_string(), "Dodo Admin".to_string()),
        AppType::Customer => (pwa.app_name.clone(), format!("Dodo {}", app.title())),
    };

    Manifest {
        name,
        short_name,
        description: pwa.description.clone(),
        start_url: pwa.start_url.clone(),
        display: pwa.display.clone(),
        background_color: pwa.background_color.clone(),
        theme_color: pwa.theme_color.clone(),
        orientation: pwa.orientation.clone(),
        icons: pwa.icons.clone(),
        scope: pwa.scope.clone(),
        dir: pwa.dir.clone(),
        lang: pwa.lang.clone(),
    }
}

pub fn service_worker_config(app: AppType) -> ServiceWorkerConfig {
    let mut urls = vec!["/", "/offline", "/static/css/main.css", "/static/js/main.js", "/static/images/logo.png"];

    urls.extend(match app {
        AppType::Customer => ["/services", "/blog", "/contact", "/about"],
        AppType::Vendor => ["/dashboard", "/bookings", "/services", "/earnings"],
        AppType::Admin => ["/dashboard", "/users", "/services", "/bookings"],
    });

    ServiceWorkerConfig {
        cache_name: format!("dodo-{}-cache-v1", app.as_str()),
        urls_to_cache: urls.into_iter().map(str::to_string).collect(),
        offline_page: "/offline".to_string(),
        cache_version: 1,
    }
}

/// The customer app is crawlable; vendor and admin portals are private.
pub fn robots_txt(app: AppType, site_url: &str, today: NaiveDate) -> String {
    let header = [
        format!("# Dodo Services {} App Robots.txt", app.title()),
        format!("# Last updated: {}", today.format("%Y-%m-%d")),
        String::new(),
    ];

    let body: Vec<String> = match app {
        AppType::Customer => vec![
            "# Allow all crawlers".into(),
            "User-agent: *".into(),
            "Allow: /".into(),
            "Disallow: /api/".into(),
            "Disallow: /account/".into(),
            "Disallow: /login".into(),
            "Disallow: /register".into(),
            "Disallow: /offline".into(),
            "Disallow: /_next/".into(),
            String::new(),
            "# Sitemap locations".into(),
            format!("Sitemap: {site_url}/sitemap-index.xml"),
            format!("Sitemap: {site_url}/sitemap.xml"),
            String::new(),
            "# Crawl delay for bots".into(),
            "Crawl-delay: 10".into(),
        ],
        AppType::Vendor | AppType::Admin => vec![
            "# Disallow all crawlers - This is a private portal".into(),
            "User-agent: *".into(),
            "Disallow: /".into(),
        ],
    };

    header.into_iter().chain(body).collect::<Vec<_>>().join("\n")
}

struct SitemapUrl<'a> {
    loc: &'a str,
    lastmod: String,
    changefreq: &'static str,
    priority: String,
}

#[derive(Template)]
#[template(path = "sitemap.xml", escape = "html")]
struct SitemapTemplate<'a> {
    urls: Vec<SitemapUrl<'a>>,
}

pub fn sitemap_xml(entries: &[SitemapEntry]) -> askama::Result<String> {
    let urls = entries
        .iter()
        .map(|entry| SitemapUrl {
            loc: &entry.url,
            lastmod: entry.last_modified.format("%Y-%m-%dT%H:%M:%S+00:00").to_string(),
            changefreq: entry.changefreq.as_str(),
            priority: format!("{:.1}", entry.priority),
        })
        .collect();

    SitemapTemplate { urls }.render()
}

/// The site map the marketing site ships with, rooted at `site_url`.
pub fn default_sitemap(site_url: &str) -> Vec<SitemapEntryPayload> {
    use ChangeFreq::*;

    let pages: [(&str, i64, ChangeFreq); 14] = [
        ("/", 10, Daily),
        ("/login", 8, Monthly),
        ("/register", 8, Monthly),
        ("/services/cleaning", 9, Weekly),
        ("/services/plumbing", 9, Weekly),
        ("/services/electrical", 9, Weekly),
        ("/about", 6, Monthly),
        ("/contact", 6, Monthly),
        ("/faq", 6, Monthly),
        ("/terms", 5, Monthly),
        ("/privacy", 5, Monthly),
        ("/blog", 8, Weekly),
        ("/blog/home-cleaning-tips", 7, Monthly),
        ("/blog/plumbing-maintenance", 7, Monthly),
    ];

    pages
        .into_iter()
        .map(|(path, tenths, changefreq)| SitemapEntryPayload {
            url: format!("{site_url}{path}"),
            priority: Decimal::new(tenths, 1),
            changefreq,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn pwa() -> PwaSettings {
        PwaSettings {
            app_name: "Dodo Services".into(),
            description: "Home services".into(),
            start_url: "/".into(),
            display: "standalone".into(),
            background_color: "#ffffff".into(),
            theme_color: "#4f46e5".into(),
            orientation: "portrait".into(),
            scope: "/".into(),
            dir: "ltr".into(),
            lang: "en-US".into(),
            icons: vec![],
        }
    }

    #[test]
    fn manifest_names_follow_the_app() {
        assert_eq!(manifest(AppType::Customer, &pwa()).short_name, "Dodo Customer");
        assert_eq!(manifest(AppType::Customer, &pwa()).name, "Dodo Services");
        assert_eq!(manifest(AppType::Vendor, &pwa()).name, "Dodo Services - Vendor Portal");
        assert_eq!(manifest(AppType::Admin, &pwa()).short_name, "Dodo Admin");
    }

    #[test]
    fn unknown_app_falls_back_to_customer() {
        let config = service_worker_config(AppType::from_path(Some("partner")));
        assert_eq!(config.cache_name, "dodo-customer-cache-v1");
        assert!(config.urls_to_cache.contains(&"/blog".to_string()));
        assert_eq!(config.urls_to_cache.len(), 9);
    }

    #[test]
    fn vendor_worker_caches_the_dashboard() {
        let config = service_worker_config(AppType::Vendor);
        assert_eq!(config.cache_name, "dodo-vendor-cache-v1");
        assert_eq!(&config.urls_to_cache[5..], ["/dashboard", "/bookings", "/services", "/earnings"]);
    }

    #[test]
    fn robots_for_customer_lists_sitemaps() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let robots = robots_txt(AppType::Customer, "https://dodoservices.com", today);

        assert!(robots.starts_with("# Dodo Services Customer App Robots.txt\n# Last updated: 2025-03-14\n"));
        assert!(robots.contains("User-agent: *\nAllow: /\nDisallow: /api/"));
        assert!(robots.contains("Sitemap: https://dodoservices.com/sitemap.xml"));
        assert!(robots.ends_with("Crawl-delay: 10"));
    }

    #[test]
    fn robots_for_private_portals_disallow_everything() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let robots = robots_txt(AppType::Admin, "https://dodoservices.com", today);

        assert!(robots.starts_with("# Dodo Services Admin App Robots.txt"));
        assert!(robots.ends_with("User-agent: *\nDisallow: /"));
        assert!(!robots.contains("Sitemap:"));
    }

    #[test]
    fn sitemap_entries_are_escaped_and_formatted() {
        let entry = SitemapEntry {
            id: Uuid::new_v4(),
            url: "https://dodoservices.com/search?q=a&b=<c>".into(),
            priority: Decimal::ONE,
            changefreq: ChangeFreq::Weekly,
            last_modified: Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
        };

        let xml = sitemap_xml(&[entry]).unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains("<loc>https://dodoservices.com/search?q=a&amp;b=&lt;c&gt;</loc>"));
        assert!(xml.contains("<lastmod>2025-01-02T03:04:05+00:00</lastmod>"));
        assert!(xml.contains("<changefreq>weekly</changefreq>"));
        assert!(xml.contains("<priority>1.0</priority>"));
        assert!(xml.contains("<mobile:mobile/>"));
        assert!(xml.trim_end().ends_with("</url>\n</urlset>"));
    }

    #[test]
    fn empty_sitemap_is_still_a_urlset() {
        let xml = sitemap_xml(&[]).unwrap();
        assert!(!xml.contains("<url>"));
        assert!(xml.trim_end().ends_with("</urlset>"));
    }

    #[test]
    fn default_sitemap_is_rooted_at_the_site() {
        let entries = default_sitemap("https://staging.dodo.test");
        assert_eq!(entries.len(), 14);
        assert_eq!(entries[0].url, "https://staging.dodo.test/");
        assert_eq!(entries[0].priority, Decimal::ONE);
        assert!(entries.iter().all(|e| e.url.starts_with("https://staging.dodo.test/")));
    }
}
