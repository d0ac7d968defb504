//! Main page: header, content tabs, main menu, footer.

use tracing::info;

use crate::locator::{ElementQuery, Strategy};
use crate::page_object::PageObject;
use crate::result::SmokeResult;
use crate::session::Session;
use crate::wait::{Signal, WaitSpec};

/// Path of the article list, where every content tab is shown
pub const ARTICLES_PATH: &str = "/ru/articles/";
/// Path fragment of the personal feed the landing page may redirect to
pub const FEED_PATH: &str = "/ru/feed";
/// Header container, the page-ready marker
pub const HEADER_SELECTOR: &str = "div.tm-header__container";
/// Heading of the services block in the main menu
pub const SERVICES_HEADER: &str = "Все сервисы Хабра";

/// One content tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentTab {
    /// Query name
    pub key: &'static str,
    /// Visible label
    pub label: &'static str,
    /// Link target
    pub href: &'static str,
}

/// Content tabs in display order
pub const CONTENT_TABS: [ContentTab; 6] = [
    ContentTab {
        key: "articles_tab",
        label: "Статьи",
        href: "/ru/articles/",
    },
    ContentTab {
        key: "posts_tab",
        label: "Посты",
        href: "/ru/posts/",
    },
    ContentTab {
        key: "news_tab",
        label: "Новости",
        href: "/ru/news/",
    },
    ContentTab {
        key: "hubs_tab",
        label: "Хабы",
        href: "/ru/hubs/",
    },
    ContentTab {
        key: "authors_tab",
        label: "Авторы",
        href: "/ru/users/",
    },
    ContentTab {
        key: "companies_tab",
        label: "Компании",
        href: "/ru/companies/",
    },
];

/// Main menu options
pub const MENU_OPTIONS: [&str; 10] = [
    "Что нового",
    "Бэкенд",
    "Фронтенд",
    "Администрирование",
    "Дизайн",
    "Менеджмент",
    "Маркетинг и контент",
    "Научпоп",
    "Разработка",
    "Все потоки",
];

/// Links of the services block
pub const SERVICE_LINKS: [&str; 4] = ["Хабр", "Q&A", "Карьера", "Курсы"];

fn header_scope() -> Strategy {
    Strategy::css(HEADER_SELECTOR)
}

fn menu_scope() -> Strategy {
    Strategy::css(
        "div.tm-header__dropdown, div.tm-base-layout__header-menu, nav[class*=\"menu\"], div[class*=\"menu\"]",
    )
    .with_text(SERVICES_HEADER)
}

fn header_link(name: &str, label: &str) -> ElementQuery {
    ElementQuery::new(name, Strategy::role("link", label))
        .within(&header_scope())
        .first()
}

fn header_button(name: &str, label: &str) -> ElementQuery {
    ElementQuery::new(name, Strategy::role("button", label))
        .within(&header_scope())
        .first()
}

fn menu_link(name: &str, label: &str) -> ElementQuery {
    ElementQuery::from_strategies(
        name,
        vec![Strategy::role_exact("link", label), Strategy::exact_text(label)],
    )
    .within(&menu_scope())
    .first()
}

/// Page object for the habr.com landing and article list
#[derive(Debug, Clone)]
pub struct MainPage {
    /// Header container
    pub header: ElementQuery,
    /// Habr logo link
    pub logo: ElementQuery,
    /// Content tabs, in [`CONTENT_TABS`] order
    pub tabs: Vec<ElementQuery>,
    /// "Все потоки"
    pub all_streams_link: ElementQuery,
    /// "Поиск"
    pub search_link: ElementQuery,
    /// "Написать публикацию"
    pub write_publication_link: ElementQuery,
    /// "Настройки"
    pub settings_button: ElementQuery,
    /// "Войти"
    pub login_button: ElementQuery,
    /// Main content area
    pub main_content: ElementQuery,
    /// Footer
    pub footer: ElementQuery,
    /// Button toggling the main menu
    pub menu_button: ElementQuery,
    /// Open menu panel
    pub menu_panel: ElementQuery,
    /// Menu options, in [`MENU_OPTIONS`] order
    pub menu_options: Vec<ElementQuery>,
    /// "Все сервисы Хабра"
    pub services_header: ElementQuery,
    /// Service links, in [`SERVICE_LINKS`] order
    pub service_links: Vec<ElementQuery>,
}

impl Default for MainPage {
    fn default() -> Self {
        Self::new()
    }
}

impl MainPage {
    /// Build every query
    #[must_use]
    pub fn new() -> Self {
        let header = header_scope();
        let tabs = CONTENT_TABS
            .iter()
            .map(|tab| {
                let query = ElementQuery::new(
                    tab.key,
                    Strategy::css(format!("a[href=\"{}\"]", tab.href)).with_text(tab.label),
                );
                // the posts tab is sometimes rendered without its href
                if tab.key == "posts_tab" {
                    query.or(Strategy::role("link", tab.label)).first()
                } else {
                    query.first()
                }
            })
            .collect();

        Self {
            header: ElementQuery::new("header_container", header.clone()).first(),
            logo: ElementQuery::from_strategies(
                "logo_link",
                vec![Strategy::css("a[href*=\"/ru/feed\"]"), Strategy::css("a[href=\"/\"]")],
            )
            .within(&header)
            .first(),
            tabs,
            all_streams_link: header_link("all_streams_link", "Все потоки"),
            search_link: header_link("search_link", "Поиск"),
            write_publication_link: header_link("write_publication_link", "Написать публикацию"),
            settings_button: header_button("settings_button", "Настройки"),
            login_button: header_button("login_button", "Войти"),
            main_content: ElementQuery::from_strategies(
                "main_content_area",
                vec![Strategy::css("main"), Strategy::css("div.tm-base-page__content")],
            )
            .first(),
            footer: ElementQuery::from_strategies(
                "footer_section",
                vec![Strategy::css("footer"), Strategy::css("div.tm-footer")],
            )
            .first(),
            menu_button: ElementQuery::from_strategies(
                "menu_button",
                vec![
                    Strategy::css("button.tm-header__dropdown-toggle"),
                    Strategy::role("button", "Меню"),
                ],
            )
            .within(&header)
            .first(),
            menu_panel: ElementQuery::new("menu_panel", menu_scope()).first(),
            menu_options: MENU_OPTIONS
                .iter()
                .map(|label| menu_link(&format!("menu_{label}"), label))
                .collect(),
            services_header: ElementQuery::new("services_header", Strategy::exact_text(SERVICES_HEADER))
                .first(),
            service_links: SERVICE_LINKS
                .iter()
                .map(|label| menu_link(&format!("service_{label}"), label))
                .collect(),
        }
    }

    /// Header links and buttons, in display order
    #[must_use]
    pub fn header_controls(&self) -> Vec<&ElementQuery> {
        vec![
            &self.all_streams_link,
            &self.search_link,
            &self.write_publication_link,
            &self.settings_button,
            &self.login_button,
        ]
    }

    async fn load(&self, session: &Session, url: &str) -> SmokeResult<()> {
        let timeouts = session.timeouts();
        session.driver().navigate(url).await?;
        let header_visible = WaitSpec::new(Signal::visible(self.header.clone()), timeouts.navigation())
            .with_poll_interval(timeouts.poll_interval());
        session.waiter().require(&header_visible).await?;
        session.waiter().settle_load(timeouts.load()).await?;
        Ok(())
    }

    /// Navigate to the site, continuing to the article list when the
    /// landing page redirects to the feed. Returns the final URL.
    pub async fn open(&self, session: &Session) -> SmokeResult<String> {
        self.load(session, session.config().base()).await?;
        let url = session.driver().current_url().await?;
        if !url.contains(FEED_PATH) {
            return Ok(url);
        }
        let articles = session.config().url(ARTICLES_PATH);
        info!(from = %url, to = %articles, "landed on feed, opening article list");
        self.load(session, &articles).await?;
        session.driver().current_url().await
    }
}

impl PageObject for MainPage {
    fn url_pattern(&self) -> &str {
        "habr.com"
    }

    fn ready_marker(&self) -> &ElementQuery {
        &self.header
    }

    fn queries(&self) -> Vec<&ElementQuery> {
        let mut all = vec![&self.header, &self.logo];
        all.extend(&self.tabs);
        all.extend(self.header_controls());
        all.extend([
            &self.main_content,
            &self.footer,
            &self.menu_button,
            &self.menu_panel,
            &self.services_header,
        ]);
        all.extend(&self.menu_options);
        all.extend(&self.service_links);
        all
    }

    fn page_name(&self) -> &str {
        "main page"
    }
}
