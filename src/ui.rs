use crate::carousel::{CarouselTiming, WINDOW_SIZE};
use crate::models::{Link, SiteRecord};
use crate::visits::STORAGE_KEY;

pub fn render_index(record: &SiteRecord, timing: &CarouselTiming) -> String {
    fill(
        INDEX_HTML,
        &[
            ("STYLE", BASE_STYLE),
            ("VIEW_KEY", STORAGE_KEY),
            ("WINDOW", &WINDOW_SIZE.to_string()),
            ("INTERVAL_MS", &timing.interval.as_millis().to_string()),
            ("FADE_MS", &timing.fade.as_millis().to_string()),
            ("VIEWS", &record.view_count.to_string()),
            ("LINKS", &render_links(&record.links)),
            ("TAGLINE", &escape_html(&record.tagline)),
        ],
    )
}

pub fn render_login() -> String {
    fill(LOGIN_HTML, &[("STYLE", BASE_STYLE)])
}

pub fn render_admin(record: &SiteRecord) -> String {
    let links = serde_json::to_string(&record.links).unwrap_or_else(|_| "[]".to_string());
    fill(
        ADMIN_HTML,
        &[
            ("STYLE", BASE_STYLE),
            ("TAGLINE", &escape_html(&record.tagline)),
            ("LINKS_JSON", &escape_html(&links)),
        ],
    )
}

/// Substitutes `{{KEY}}` markers in a single left-to-right pass. Inserted
/// values are never scanned again, and unknown markers are left as they are.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let hit = after.find("}}").and_then(|end| {
            values
                .iter()
                .find(|(key, _)| *key == &after[..end])
                .map(|(_, value)| (end, *value))
        });
        match hit {
            Some((end, value)) => {
                out.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn render_links(links: &[Link]) -> String {
    if links.is_empty() {
        return r#"<p class="hint">No links yet.</p>"#.to_string();
    }
    links
        .iter()
        .map(|link| {
            format!(
                r#"<a class="link" href="{url}" target="_blank" rel="noopener"><span class="icon">{icon}</span><span class="name">{name}</span><span class="caption">{caption}</span></a>"#,
                url = escape_html(&link.url),
                icon = escape_html(&link.icon),
                name = escape_html(&link.name),
                caption = escape_html(&link.short_caption),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

const BASE_STYLE: &str = r#"
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #1d1026;
      --bg-2: #ff7ab6;
      --ink: #fdf4fa;
      --accent: #ff6b9a;
      --accent-2: #7a4ea3;
      --card: rgba(30, 16, 40, 0.78);
      --shadow: 0 24px 60px rgba(0, 0, 0, 0.35);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #3a1747 60%, #14091b 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(720px, 100%);
      background: var(--card);
      backdrop-filter: blur(12px);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 24px;
      animation: rise 600ms ease;
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      font-weight: 600;
      font-size: clamp(1.8rem, 4vw, 2.6rem);
      margin: 0;
      text-align: center;
    }

    button, input, textarea {
      font: inherit;
    }

    button {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 12px 18px;
      font-weight: 600;
      cursor: pointer;
      background: var(--accent);
      color: white;
    }

    input, textarea {
      width: 100%;
      border-radius: 14px;
      border: 1px solid rgba(255, 255, 255, 0.2);
      background: rgba(255, 255, 255, 0.08);
      color: var(--ink);
      padding: 12px;
    }

    .hint {
      margin: 0;
      color: #c9b6d6;
      font-size: 0.9rem;
      text-align: center;
    }

    .status[data-type="error"] {
      color: #ff8a7a;
    }

    .status[data-type="ok"] {
      color: #8be0a8;
    }

    @keyframes rise {
      from {
        opacity: 0;
        transform: translateY(18px);
      }
      to {
        opacity: 1;
        transform: translateY(0);
      }
    }
"#;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Patz Brat</title>
  <style>
    {{STYLE}}

    .links {
      display: grid;
      gap: 12px;
    }

    .link {
      display: grid;
      grid-template-columns: 32px 1fr auto;
      align-items: center;
      gap: 12px;
      padding: 14px 18px;
      border-radius: 18px;
      background: rgba(255, 255, 255, 0.08);
      color: var(--ink);
      text-decoration: none;
      transition: transform 150ms ease;
    }

    .link:hover {
      transform: translateY(-2px);
    }

    .link .caption {
      color: #c9b6d6;
      font-size: 0.85rem;
    }

    .gallery {
      display: flex;
      justify-content: center;
      gap: 12px;
      min-height: 160px;
    }

    .floating-img {
      width: 30%;
      aspect-ratio: 3 / 4;
      object-fit: cover;
      border-radius: 18px;
      transition: opacity {{FADE_MS}}ms ease;
    }

    .floating-img.fade-out {
      opacity: 0;
    }

    .floating-img.fade-in {
      animation: fade-in {{FADE_MS}}ms ease;
    }

    @keyframes fade-in {
      from { opacity: 0; }
      to { opacity: 1; }
    }
  </style>
</head>
<body>
  <main class="app">
    <h1 id="tagline">{{TAGLINE}}</h1>
    <section class="gallery" id="floatingGallery"></section>
    <section class="links">
      {{LINKS}}
    </section>
    <p class="hint">Views: <span id="viewCount">{{VIEWS}}</span></p>
  </main>

  <script>
    const VIEW_KEY = '{{VIEW_KEY}}';
    const WINDOW = {{WINDOW}};
    const INTERVAL_MS = {{INTERVAL_MS}};
    const FADE_MS = {{FADE_MS}};

    const updateViewCount = async () => {
      const counted = localStorage.getItem(VIEW_KEY) !== null;
      const url = counted ? '/api/views' : '/api/views?count=true';
      try {
        const res = await fetch(url);
        if (!res.ok) {
          throw new Error(`views request failed: ${res.status}`);
        }
        const data = await res.json();
        document.getElementById('viewCount').textContent = data.views;
        if (!counted) {
          localStorage.setItem(VIEW_KEY, 'true');
        }
      } catch (err) {
        console.error('Error fetching view count:', err);
      }
    };

    const startCarousel = async () => {
      const gallery = document.getElementById('floatingGallery');
      let images;
      try {
        const res = await fetch('/api/images');
        images = await res.json();
      } catch (err) {
        console.error('Error fetching images:', err);
        return;
      }

      if (!images.length) {
        gallery.innerHTML = '<p class="hint">No images uploaded yet.</p>';
        return;
      }

      const makeImage = (src, index, extraClass) => {
        const img = document.createElement('img');
        img.className = extraClass ? `floating-img ${extraClass}` : 'floating-img';
        img.src = src;
        img.dataset.id = index;
        return img;
      };

      images.slice(0, WINDOW).forEach((src, index) => gallery.appendChild(makeImage(src, index)));
      if (images.length < WINDOW) {
        return;
      }

      let cursor = 0;
      let fading = false;
      setInterval(() => {
        const displayed = gallery.querySelectorAll('.floating-img');
        if (fading || !displayed.length) {
          return;
        }
        fading = true;
        const nextIndex = (cursor + WINDOW) % images.length;
        const outgoing = displayed[0];
        outgoing.classList.add('fade-out');
        setTimeout(() => {
          outgoing.remove();
          gallery.appendChild(makeImage(images[nextIndex], nextIndex, 'fade-in'));
          cursor = (cursor + 1) % images.length;
          fading = false;
        }, FADE_MS);
      }, INTERVAL_MS);
    };

    document.addEventListener('click', (event) => {
      if (event.target.tagName === 'IMG' && event.target.dataset.id) {
        fetch(`/api/click/${event.target.dataset.id}`, { method: 'POST' }).catch(() => {});
      }
    });

    document.addEventListener('DOMContentLoaded', () => {
      updateViewCount();
      startCarousel();
    });
  </script>
</body>
</html>
"#;

const LOGIN_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Admin login</title>
  <style>
    {{STYLE}}

    form {
      display: grid;
      gap: 14px;
    }
  </style>
</head>
<body>
  <main class="app">
    <h1>Admin</h1>
    <form method="post" action="/admin/login">
      <input name="username" placeholder="Username" autocomplete="username" required />
      <input name="password" type="password" placeholder="Password" autocomplete="current-password" required />
      <button type="submit">Log in</button>
    </form>
  </main>
</body>
</html>
"#;

const ADMIN_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Admin</title>
  <style>
    {{STYLE}}

    form, section {
      display: grid;
      gap: 12px;
    }

    textarea {
      min-height: 180px;
      font-family: ui-monospace, monospace;
      font-size: 0.85rem;
    }

    .thumbs {
      display: grid;
      grid-template-columns: repeat(auto-fill, minmax(120px, 1fr));
      gap: 12px;
    }

    .thumb {
      display: grid;
      gap: 6px;
    }

    .thumb img {
      width: 100%;
      aspect-ratio: 1;
      object-fit: cover;
      border-radius: 12px;
    }

    .thumb button {
      background: var(--accent-2);
      padding: 6px 10px;
      font-size: 0.8rem;
    }
  </style>
</head>
<body>
  <main class="app">
    <h1>Site admin</h1>

    <form id="site-form">
      <input id="tagline" name="tagline" value="{{TAGLINE}}" />
      <textarea id="links" name="links">{{LINKS_JSON}}</textarea>
      <button type="submit">Save</button>
    </form>

    <form id="upload-form">
      <input id="image" name="image" type="file" accept="image/*" required />
      <button type="submit">Upload</button>
    </form>

    <section>
      <div class="thumbs" id="thumbs"></div>
    </section>

    <div class="status" id="status"></div>
    <p class="hint"><a href="/admin/logout">Log out</a></p>
  </main>

  <script>
    const statusEl = document.getElementById('status');
    const thumbsEl = document.getElementById('thumbs');

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const loadImages = async () => {
      const res = await fetch('/api/images');
      if (!res.ok) {
        throw new Error('Unable to load images');
      }
      const images = await res.json();
      thumbsEl.innerHTML = '';
      images.forEach((url) => {
        const wrap = document.createElement('div');
        wrap.className = 'thumb';
        const img = document.createElement('img');
        img.src = url;
        const button = document.createElement('button');
        button.type = 'button';
        button.textContent = 'Delete';
        button.addEventListener('click', () => {
          removeImage(url).catch((err) => setStatus(err.message, 'error'));
        });
        wrap.append(img, button);
        thumbsEl.appendChild(wrap);
      });
    };

    const removeImage = async (url) => {
      const res = await fetch('/api/delete', {
        method: 'DELETE',
        headers: { 'content-type': 'application/json' },
        body: JSON.stringify({ url })
      });
      if (!res.ok) {
        throw new Error('Delete failed');
      }
      setStatus('Deleted', 'ok');
      await loadImages();
    };

    document.getElementById('site-form').addEventListener('submit', async (event) => {
      event.preventDefault();
      try {
        const links = JSON.parse(document.getElementById('links').value || '[]');
        const res = await fetch('/api/update-site-data', {
          method: 'POST',
          headers: { 'content-type': 'application/json' },
          body: JSON.stringify({ tagline: document.getElementById('tagline').value, links })
        });
        if (!res.ok) {
          throw new Error('Save failed');
        }
        setStatus('Saved', 'ok');
      } catch (err) {
        setStatus(err.message, 'error');
      }
    });

    document.getElementById('upload-form').addEventListener('submit', async (event) => {
      event.preventDefault();
      setStatus('Uploading...', 'info');
      try {
        const res = await fetch('/admin/upload', { method: 'POST', body: new FormData(event.target) });
        const data = await res.json();
        if (!data.success) {
          throw new Error(data.error || 'Upload failed');
        }
        event.target.reset();
        setStatus('Uploaded', 'ok');
        await loadImages();
      } catch (err) {
        setStatus(err.message, 'error');
      }
    });

    loadImages().catch((err) => setStatus(err.message, 'error'));
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_escapes_user_content() {
        let record = SiteRecord {
            tagline: "<script>x</script>".into(),
            links: vec![Link {
                name: "a&b".into(),
                url: "https://example.com/?q=\"x\"".into(),
                icon: String::new(),
                short_caption: String::new(),
            }],
            ..SiteRecord::default()
        };
        let html = render_index(&record, &CarouselTiming::default());
        assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
        assert!(html.contains("a&amp;b"));
        assert!(html.contains("&quot;x&quot;"));
        assert!(!html.contains("<script>x</script>"));
    }

    #[test]
    fn index_carries_carousel_timing() {
        let html = render_index(&SiteRecord::default(), &CarouselTiming::default());
        assert!(html.contains("const INTERVAL_MS = 4000;"));
        assert!(html.contains("const FADE_MS = 1000;"));
        assert!(html.contains("const WINDOW = 3;"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn placeholders_in_user_content_stay_literal() {
        let record = SiteRecord {
            tagline: "{{LINKS}}".into(),
            links: vec![Link {
                name: "{{TAGLINE}}".into(),
                url: "https://example.com/{{VIEWS}}".into(),
                icon: String::new(),
                short_caption: String::new(),
            }],
            view_count: 9,
            ..SiteRecord::default()
        };
        let html = render_index(&record, &CarouselTiming::default());
        assert!(html.contains(r#"<h1 id="tagline">{{LINKS}}</h1>"#));
        assert!(html.contains(r#"<span class="name">{{TAGLINE}}</span>"#));
        assert!(html.contains("https://example.com/{{VIEWS}}"));
        assert_eq!(html.matches(r#"class="link""#).count(), 1);

        let admin = render_admin(&record);
        assert!(admin.contains(r#"value="{{LINKS}}""#));
    }

    #[test]
    fn fill_leaves_unknown_markers_alone() {
        assert_eq!(fill("a {{X}} {{Y}} {{", &[("X", "{{Y}}")]), "a {{Y}} {{Y}} {{");
    }

    #[test]
    fn carousel_waits_for_the_fade_before_rotating_again() {
        let html = render_index(&SiteRecord::default(), &CarouselTiming::default());
        assert!(html.contains("let fading = false;"));
        assert!(html.contains("if (fading || !displayed.length)"));
        assert!(html.contains("fading = false;\n        }, FADE_MS);"));
    }

    #[test]
    fn admin_page_prefills_links() {
        let record = SiteRecord {
            links: vec![Link {
                name: "Shop".into(),
                url: "https://shop".into(),
                icon: String::new(),
                short_caption: String::new(),
            }],
            ..SiteRecord::default()
        };
        let html = render_admin(&record);
        assert!(html.contains("&quot;name&quot;:&quot;Shop&quot;"));
    }
}
