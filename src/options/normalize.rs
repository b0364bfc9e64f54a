use super::{
    GotoOptions, Margin, PartialGotoOptions, PartialMargin, PartialPdfOptions,
    PartialRenderOptions, PartialViewportOptions, PdfOptions, RenderOptions, ViewportOptions,
};

/// Deep-merges caller options over `defaults`.
///
/// Every present leaf wins, including `false` and `0`; every absent leaf and
/// every absent group falls back to the default. Purely structural: values are
/// not range-checked here.
pub fn normalize(raw: PartialRenderOptions, defaults: &RenderOptions) -> RenderOptions {
    raw.merge_over(defaults)
}

trait MergeOver {
    type Full: Clone;

    fn merge_over(self, defaults: &Self::Full) -> Self::Full;
}

impl<P: MergeOver> MergeOver for Option<P> {
    type Full = P::Full;

    fn merge_over(self, defaults: &Self::Full) -> Self::Full {
        match self {
            Some(partial) => partial.merge_over(defaults),
            None => defaults.clone(),
        }
    }
}

impl MergeOver for PartialRenderOptions {
    type Full = RenderOptions;

    fn merge_over(self, defaults: &RenderOptions) -> RenderOptions {
        RenderOptions {
            url: self.url.or_else(|| defaults.url.clone()),
            html: self.html.or_else(|| defaults.html.clone()),
            attachment_name: self
                .attachment_name
                .or_else(|| defaults.attachment_name.clone()),
            scroll_page: self.scroll_page.unwrap_or(defaults.scroll_page),
            emulate_screen_media: self
                .emulate_screen_media
                .unwrap_or(defaults.emulate_screen_media),
            ignore_https_errors: self
                .ignore_https_errors
                .unwrap_or(defaults.ignore_https_errors),
            wait_for: self.wait_for.or_else(|| defaults.wait_for.clone()),
            viewport: self.viewport.merge_over(&defaults.viewport),
            goto: self.goto.merge_over(&defaults.goto),
            pdf: self.pdf.merge_over(&defaults.pdf),
        }
    }
}

impl MergeOver for PartialViewportOptions {
    type Full = ViewportOptions;

    fn merge_over(self, defaults: &ViewportOptions) -> ViewportOptions {
        ViewportOptions {
            width: self.width.unwrap_or(defaults.width),
            height: self.height.unwrap_or(defaults.height),
            device_scale_factor: self
                .device_scale_factor
                .unwrap_or(defaults.device_scale_factor),
            is_mobile: self.is_mobile.unwrap_or(defaults.is_mobile),
            has_touch: self.has_touch.unwrap_or(defaults.has_touch),
            is_landscape: self.is_landscape.unwrap_or(defaults.is_landscape),
        }
    }
}

impl MergeOver for PartialGotoOptions {
    type Full = GotoOptions;

    fn merge_over(self, defaults: &GotoOptions) -> GotoOptions {
        GotoOptions {
            timeout: self.timeout.unwrap_or(defaults.timeout),
            wait_until: self.wait_until.unwrap_or(defaults.wait_until),
            network_idle_inflight: self
                .network_idle_inflight
                .unwrap_or(defaults.network_idle_inflight),
            network_idle_timeout: self
                .network_idle_timeout
                .unwrap_or(defaults.network_idle_timeout),
        }
    }
}

impl MergeOver for PartialPdfOptions {
    type Full = PdfOptions;

    fn merge_over(self, defaults: &PdfOptions) -> PdfOptions {
        PdfOptions {
            scale: self.scale.unwrap_or(defaults.scale),
            display_header_footer: self
                .display_header_footer
                .unwrap_or(defaults.display_header_footer),
            landscape: self.landscape.unwrap_or(defaults.landscape),
            page_ranges: self
                .page_ranges
                .unwrap_or_else(|| defaults.page_ranges.clone()),
            format: self.format.unwrap_or_else(|| defaults.format.clone()),
            width: self.width.or_else(|| defaults.width.clone()),
            height: self.height.or_else(|| defaults.height.clone()),
            margin: self.margin.merge_over(&defaults.margin),
            print_background: self.print_background.unwrap_or(defaults.print_background),
        }
    }
}

impl MergeOver for PartialMargin {
    type Full = Margin;

    fn merge_over(self, defaults: &Margin) -> Margin {
        Margin {
            top: self.top.unwrap_or_else(|| defaults.top.clone()),
            right: self.right.unwrap_or_else(|| defaults.right.clone()),
            bottom: self.bottom.unwrap_or_else(|| defaults.bottom.clone()),
            left: self.left.unwrap_or_else(|| defaults.left.clone()),
        }
    }
}
