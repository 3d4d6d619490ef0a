/*!

This is the long-form manual for `double_entry` and `devalid`.

## Double entry

To catch transcription errors, every paper survey is typed in twice. The
second transcription is stored in the same survey export as the first one,
with the participant identifier prefixed by a marker such as `X_`:

| id    | name  | score |
|-------|-------|-------|
| 1     | Alice | 90    |
| X_1   | alice | 91    |

The tool pairs `1` with `X_1` and compares every relevant column. Values
are compared after trimming surrounding whitespace and ignoring case, so
`Alice` and `alice` agree while `90` and `91` do not:

```text
+------------------------------------------------+
|                                                |
|                       1                        |
|                                                |
+------------------------------------------------+
[Mismatch] score originally was "90" but was "91" in the double entry.
```

## Input formats

The survey export must be a `.csv` (comma-separated) or `.tsv`
(tab-separated) file. Quoted fields follow the usual CSV rules. Qualtrics
writes three header rows, which is the default header row count.

The default encoding is `auto`: a byte-order mark decides the encoding
(Qualtrics TSV exports are UTF-16 with a mark), and a file without one is
read as UTF-8. A file without a mark in another encoding needs the encoding
set explicitly. `utf-16` means little endian, as written by Qualtrics and
Excel; big-endian files without a mark need `utf-16be`. The byte-order mark
always wins over the configured encoding.

## Columns

Columns are given either as zero-based numbers or as letters. Letters are
decoded with a legacy rule: each letter adds its position
in the alphabet plus 26 times its position in the text. `A` is 0, `F` is 5,
`AA` is 26 and `AB` is 27. This differs from spreadsheet column names past
`Z`.

* the participant id column holds the identifier (compared case-insensitively)
* the first relevant column is where comparisons start; earlier columns,
  typically dates and metadata added by the survey software, are ignored.
  The id column itself is never compared.

## Export modes

* `annotated` (default): the header rows, then every record. Each double
  entry directly follows its original. In the double entry, compared cells
  read `OK` when they agree and `!= <original value>` when they do not.
* `comparison`: the header rows, then every record. Each pair is followed by
  a row tagging the compared columns as `SAME` or `MISMATCH`, with
  `COMPARISON_<id>` in the id column.
* `mismatch-table`: one row per mismatched column, with the original and
  double-entry identifiers, the column name and index, and both values.

Records that lost their identifier to a later duplicate are appended at the
end of the `annotated` and `comparison` exports. No row is ever dropped.

## Notices

Duplicate identifiers, blank identifiers and double entries without an
original are reported but do not stop the analysis. With duplicates, the
last record of an identifier is the one that gets compared.
*/
