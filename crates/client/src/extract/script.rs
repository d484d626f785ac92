//! In-page extraction routine.
//!
//! The script is a single self-contained expression: it closes over nothing
//! from the host and returns a JSON array of descriptors in document order.
//! Tier assignment happens on the Rust side; the selector list here only
//! decides which elements are worth reporting.

/// Expression evaluated inside a rendered page.
pub const EXTRACTION_SCRIPT: &str = r#"(() => {
  const WHITELIST = ['id', 'class', 'type', 'name', 'role', 'data-testid'];
  const SELECTORS = [
    'button', 'input', 'textarea', 'select', 'form',
    '[role="button"]', '[onclick]', '[type="submit"]', '[class*="btn"]', '[class*="button"]',
    'a', 'nav', 'header', 'footer', 'aside', 'section',
    '[role="navigation"]', '[role="main"]',
    '[class*="nav"]', '[class*="menu"]', '[class*="container"]', '[class*="content"]',
    'h1', 'h2', 'h3', 'h4', 'h5', 'h6', 'main', 'article',
    '[role="heading"]', '[class*="title"]', '[class*="heading"]'
  ].join(',');
  try {
    return Array.from(document.querySelectorAll(SELECTORS)).map((el, index) => {
      const attributes = {};
      for (const name of WHITELIST) {
        const value = el.getAttribute(name);
        if (value !== null) attributes[name] = value;
      }
      const raw = el.innerText || el.textContent || '';
      const text = raw.replace(/\s+/g, ' ').trim().slice(0, 100);
      const descriptor = {
        tag: el.tagName.toLowerCase(),
        attributes,
        position: index,
        clickable: el.hasAttribute('onclick')
      };
      if (text) descriptor.textContent = text;
      return descriptor;
    });
  } catch (e) {
    return [];
  }
})()"#;
