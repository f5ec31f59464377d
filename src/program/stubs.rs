//! Declaration-only sources for the standard-library packages the checker knows about.
//!
//! They are parsed with the same front end as user code. Only declarations matter: functions
//! have no bodies and variables no initializers.

pub fn stub_source(path: &str) -> Option<&'static str> {
    Some(match path {
        "context" => CONTEXT,
        "errors" => ERRORS,
        "fmt" => FMT,
        "io" => IO,
        "strings" => STRINGS,
        "time" => TIME,
        _ => return None,
    })
}

pub fn stub_paths() -> &'static [&'static str] {
    &["context", "errors", "fmt", "io", "strings", "time"]
}

const CONTEXT: &str = r#"package context

import "time"

type Context interface {
	Deadline() (deadline time.Time, ok bool)
	Done() <-chan struct{}
	Err() error
	Value(key any) any
}

type CancelFunc func()
type CancelCauseFunc func(cause error)

var Canceled error
var DeadlineExceeded error

func Background() Context
func TODO() Context
func WithCancel(parent Context) (ctx Context, cancel CancelFunc)
func WithCancelCause(parent Context) (ctx Context, cancel CancelCauseFunc)
func WithDeadline(parent Context, d time.Time) (Context, CancelFunc)
func WithTimeout(parent Context, timeout time.Duration) (Context, CancelFunc)
func WithValue(parent Context, key, val any) Context
func WithoutCancel(parent Context) Context
func Cause(c Context) error
func AfterFunc(ctx Context, f func()) (stop func() bool)
"#;

const ERRORS: &str = r#"package errors

func New(text string) error
func Is(err, target error) bool
func As(err error, target any) bool
func Unwrap(err error) error
func Join(errs ...error) error

var ErrUnsupported error
"#;

const FMT: &str = r#"package fmt

import "io"

type Stringer interface {
	String() string
}

type State interface {
	Write(b []byte) (n int, err error)
	Width() (wid int, ok bool)
	Precision() (prec int, ok bool)
	Flag(c int) bool
}

type Formatter interface {
	Format(f State, verb rune)
}

func Print(a ...any) (n int, err error)
func Println(a ...any) (n int, err error)
func Printf(format string, a ...any) (n int, err error)
func Sprint(a ...any) string
func Sprintln(a ...any) string
func Sprintf(format string, a ...any) string
func Fprint(w io.Writer, a ...any) (n int, err error)
func Fprintln(w io.Writer, a ...any) (n int, err error)
func Fprintf(w io.Writer, format string, a ...any) (n int, err error)
func Errorf(format string, a ...any) error
func Sscanf(str string, format string, a ...any) (n int, err error)
"#;

const IO: &str = r#"package io

type Reader interface {
	Read(p []byte) (n int, err error)
}

type Writer interface {
	Write(p []byte) (n int, err error)
}

type Closer interface {
	Close() error
}

type ReadWriter interface {
	Reader
	Writer
}

type ReadCloser interface {
	Reader
	Closer
}

type WriteCloser interface {
	Writer
	Closer
}

type ReadWriteCloser interface {
	Reader
	Writer
	Closer
}

type StringWriter interface {
	WriteString(s string) (n int, err error)
}

var EOF error
var ErrUnexpectedEOF error
var Discard Writer

func ReadAll(r Reader) ([]byte, error)
func Copy(dst Writer, src Reader) (written int64, err error)
func WriteString(w Writer, s string) (n int, err error)
func NopCloser(r Reader) ReadCloser
"#;

const STRINGS: &str = r#"package strings

type Builder struct {
	buf []byte
}

func (b *Builder) String() string
func (b *Builder) Len() int
func (b *Builder) Reset()
func (b *Builder) Grow(n int)
func (b *Builder) Write(p []byte) (int, error)
func (b *Builder) WriteByte(c byte) error
func (b *Builder) WriteRune(r rune) (int, error)
func (b *Builder) WriteString(s string) (int, error)

type Reader struct {
	s string
	i int64
}

func (r *Reader) Len() int
func (r *Reader) Read(b []byte) (n int, err error)

func NewReader(s string) *Reader
func Contains(s, substr string) bool
func ContainsRune(s string, r rune) bool
func Count(s, substr string) int
func EqualFold(s, t string) bool
func Fields(s string) []string
func HasPrefix(s, prefix string) bool
func HasSuffix(s, suffix string) bool
func Index(s, substr string) int
func Join(elems []string, sep string) string
func Repeat(s string, count int) string
func Replace(s, old, new string, n int) string
func ReplaceAll(s, old, new string) string
func Split(s, sep string) []string
func SplitN(s, sep string, n int) []string
func Cut(s, sep string) (before, after string, found bool)
func ToLower(s string) string
func ToUpper(s string) string
func TrimSpace(s string) string
func TrimPrefix(s, prefix string) string
func TrimSuffix(s, suffix string) string
func Trim(s, cutset string) string
"#;

const TIME: &str = r#"package time

type Duration int64

const (
	Nanosecond  Duration = 1
	Microsecond          = 1000 * Nanosecond
	Millisecond          = 1000 * Microsecond
	Second               = 1000 * Millisecond
	Minute               = 60 * Second
	Hour                 = 60 * Minute
)

func (d Duration) String() string
func (d Duration) Seconds() float64
func (d Duration) Milliseconds() int64
func (d Duration) Nanoseconds() int64

type Month int
type Weekday int

func (m Month) String() string
func (d Weekday) String() string

type Location struct {
	name string
}

var UTC *Location
var Local *Location

type Time struct {
	wall uint64
	ext  int64
	loc  *Location
}

func (t Time) Add(d Duration) Time
func (t Time) Sub(u Time) Duration
func (t Time) After(u Time) bool
func (t Time) Before(u Time) bool
func (t Time) Equal(u Time) bool
func (t Time) IsZero() bool
func (t Time) Unix() int64
func (t Time) UnixNano() int64
func (t Time) UnixMilli() int64
func (t Time) Format(layout string) string
func (t Time) String() string
func (t Time) UTC() Time
func (t Time) Year() int
func (t Time) Month() Month
func (t Time) Day() int
func (t Time) Weekday() Weekday
func (t Time) Truncate(d Duration) Time

type Timer struct {
	C <-chan Time
}

func (t *Timer) Stop() bool
func (t *Timer) Reset(d Duration) bool

type Ticker struct {
	C <-chan Time
}

func (t *Ticker) Stop()

const RFC3339 = "2006-01-02T15:04:05Z07:00"

func Now() Time
func Since(t Time) Duration
func Until(t Time) Duration
func Sleep(d Duration)
func Unix(sec int64, nsec int64) Time
func After(d Duration) <-chan Time
func Tick(d Duration) <-chan Time
func NewTimer(d Duration) *Timer
func NewTicker(d Duration) *Ticker
func ParseDuration(s string) (Duration, error)
func Parse(layout, value string) (Time, error)
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_stub_parses() {
        for path in stub_paths() {
            let src = stub_source(path).unwrap();
            let tree = go_syntax::parse_source(src)
                .unwrap_or_else(|e| panic!("stub {path} does not parse: {e}"));
            assert_eq!(tree.package_name(), *path);
        }
    }

    #[test]
    fn unknown_paths_have_no_stub() {
        assert!(stub_source("net/http").is_none());
    }
}
