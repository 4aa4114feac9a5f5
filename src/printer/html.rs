use crate::error::PrintError;

/// Render a self-contained HTML document embedding the rows into a
/// client-side paginated Grid.js table.
pub(super) fn render_grid(
    title: &str,
    headers: &[String],
    rows: &[Vec<String>],
    pagination_limit: usize,
) -> Result<String, PrintError> {
    let columns =
        serde_json::to_string(headers).map_err(|err| PrintError::HtmlPayload { source: err })?;
    let data =
        serde_json::to_string(rows).map_err(|err| PrintError::HtmlPayload { source: err })?;

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>{title}</title>
  <link href="https://cdn.jsdelivr.net/npm/gridjs/dist/theme/mermaid.min.css" rel="stylesheet" />
  <script src="https://cdn.jsdelivr.net/npm/gridjs/dist/gridjs.umd.js"></script>
  <style>body {{ margin: 1rem; font-family: sans-serif; }}</style>
</head>
<body>
  <div id="grid"></div>
  <script>
    new gridjs.Grid({{
      columns: {columns},
      data: {data},
      sort: true,
      search: true,
      pagination: {{ limit: {pagination_limit} }},
    }}).render(document.getElementById("grid"));
  </script>
</body>
</html>
"#
    ))
}
