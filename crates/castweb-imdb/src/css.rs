//! CSS selectors and markers matching the site markup

pub mod title_page {
    //! A single movie or show page

    pub const CAST_CREW_LINK: &str = "a.ipc-metadata-list-item__icon-link";
}

pub mod crew_listing {
    //! The full Cast & Crew page of a title

    pub const PRIMARY_PHOTO: &str = "td.primary_photo";
}

pub mod person_page {
    //! An actor or actress profile page

    pub const NAME: &str = "span.itemprop";
    pub const ACTING_HEAD: &str = r#"div[id="filmo-head-actor"], div[id="filmo-head-actress"]"#;
    pub const SECTION_CLASS: &str = "filmo-category-section";
    pub const ROW: &str = "div.filmo-row";
}
